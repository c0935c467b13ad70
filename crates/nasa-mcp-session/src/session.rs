use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use nasa_mcp_core::{ResultPage, SessionId};

use crate::events::EventLog;

/// Per-session state: the exclusively owned result page, the outbound
/// event log, and the transport lifecycle bits.
///
/// The page lives behind a `tokio::sync::Mutex` that operations hold for
/// their full duration, upstream I/O included. That serializes mutations
/// within a session — a slow search can never interleave with an advance —
/// while different sessions proceed independently.
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    last_activity: AtomicU64,
    closed: AtomicBool,
    page: Mutex<Option<ResultPage>>,
    events: EventLog,
    stream_guard: parking_lot::Mutex<Option<CancellationToken>>,
}

impl Session {
    pub fn new(id: SessionId, log_capacity: usize) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            last_activity: AtomicU64::new(now_secs()),
            closed: AtomicBool::new(false),
            page: Mutex::new(None),
            events: EventLog::new(log_capacity),
            stream_guard: parking_lot::Mutex::new(None),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The result page slot. `None` until the first successful search.
    pub fn page(&self) -> &Mutex<Option<ResultPage>> {
        &self.page
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Record activity for idle-eviction bookkeeping.
    pub fn touch(&self) {
        self.last_activity.store(now_secs(), Ordering::Relaxed);
    }

    /// Seconds since the last request touched this session.
    pub fn idle_secs(&self) -> u64 {
        now_secs().saturating_sub(self.last_activity.load(Ordering::Relaxed))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Terminal transition. Idempotent; also tears down any live
    /// pull-stream so its consumer sees the end of the channel.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
        if let Some(token) = self.stream_guard.lock().take() {
            token.cancel();
        }
    }

    /// Attach a pull-stream consumer, taking over from any previous one.
    ///
    /// At most one stream is live per session: the token of the previous
    /// stream is cancelled and a fresh token for the new stream returned.
    pub fn attach_stream(&self) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self.stream_guard.lock().replace(token.clone());
        if let Some(old) = previous {
            old.cancel();
        }
        token
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
