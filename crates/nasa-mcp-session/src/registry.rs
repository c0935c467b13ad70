use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, info};

use nasa_mcp_core::SessionId;

use crate::events::DEFAULT_LOG_CAPACITY;
use crate::session::Session;

/// Registry tuning knobs.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Evict sessions with no activity for this long.
    pub idle_timeout: Duration,
    /// Outbound events retained per session for stream replay.
    pub event_log_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30 * 60),
            event_log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

/// Maps session identifiers to their per-session state.
///
/// The map is the only structure shared across sessions. Entries are
/// fully constructed before insertion, so a concurrent `resolve` never
/// observes a half-built session, and an id returned by `begin` always
/// resolves.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Session>>,
    config: RegistryConfig,
}

impl SessionRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    /// Allocate and register a fresh session.
    pub fn begin(&self) -> Arc<Session> {
        let id = SessionId::new();
        let session = Arc::new(Session::new(id.clone(), self.config.event_log_capacity));
        let _ = self.sessions.insert(id.clone(), Arc::clone(&session));
        info!(session_id = %id, "session initialized");
        session
    }

    /// O(1) lookup. `None` for unknown or already-closed ids — an expected
    /// client-correctable condition, not a fault.
    pub fn resolve(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Evict a session. Idempotent; returns whether an entry was removed.
    pub fn end(&self, id: &SessionId) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                session.close();
                let age_secs = (Utc::now() - session.created_at()).num_seconds();
                info!(session_id = %id, age_secs, "session closed");
                true
            }
            None => false,
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Tear down every session, each in isolation: one session's teardown
    /// never blocks another's.
    pub fn close_all(&self) {
        let ids: Vec<SessionId> = self.sessions.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            let _ = self.end(&id);
        }
    }

    /// Evict sessions idle past the configured timeout.
    pub fn sweep_idle(&self) -> usize {
        let timeout = self.config.idle_timeout.as_secs();
        let idle: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_secs() > timeout)
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for id in idle {
            if self.end(&id) {
                removed += 1;
                debug!(session_id = %id, "evicted idle session");
            }
        }
        removed
    }
}

/// Start a background task that periodically evicts idle sessions.
pub fn start_sweep_task(
    registry: Arc<SessionRegistry>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = registry.sweep_idle();
            if removed > 0 {
                info!(removed, "idle session sweep");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(RegistryConfig::default())
    }

    #[test]
    fn begin_returns_resolvable_session() {
        let reg = registry();
        let session = reg.begin();
        let resolved = reg.resolve(session.id()).unwrap();
        assert_eq!(resolved.id(), session.id());
        assert_eq!(reg.count(), 1);
    }

    #[test]
    fn concurrent_begins_get_distinct_ids() {
        let reg = Arc::new(registry());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || reg.begin().id().clone())
            })
            .collect();

        let mut ids: Vec<SessionId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert_eq!(reg.count(), 8);
    }

    #[test]
    fn resolve_unknown_is_none() {
        let reg = registry();
        assert!(reg.resolve(&SessionId::from_raw("sess_nope")).is_none());
    }

    #[test]
    fn end_is_idempotent_and_closes() {
        let reg = registry();
        let session = reg.begin();
        let id = session.id().clone();

        assert!(reg.end(&id));
        assert!(session.is_closed());
        assert!(reg.resolve(&id).is_none());
        assert!(!reg.end(&id));
    }

    #[test]
    fn close_all_empties_registry() {
        let reg = registry();
        let a = reg.begin();
        let b = reg.begin();
        reg.close_all();
        assert_eq!(reg.count(), 0);
        assert!(a.is_closed());
        assert!(b.is_closed());
    }

    #[test]
    fn sweep_evicts_only_idle_sessions() {
        let reg = SessionRegistry::new(RegistryConfig {
            idle_timeout: Duration::from_secs(60),
            ..Default::default()
        });
        let idle = reg.begin();
        let fresh = reg.begin();

        // Backdate the idle session well past the timeout.
        idle.touch();
        std::thread::sleep(Duration::from_millis(10));
        let removed = reg.sweep_idle();
        assert_eq!(removed, 0, "nothing is idle yet");

        // Nothing we can do to age a session without waiting, so drive the
        // decision through idle_secs directly: a zero-timeout registry
        // evicts anything with any measurable idle time.
        let reg = SessionRegistry::new(RegistryConfig {
            idle_timeout: Duration::from_secs(0),
            ..Default::default()
        });
        let s = reg.begin();
        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(reg.sweep_idle(), 1);
        assert!(s.is_closed());
        let _ = fresh;
    }

    #[test]
    fn session_isolation_across_entries() {
        let reg = registry();
        let a = reg.begin();
        let b = reg.begin();
        let _ = a.events().append("only-a");
        assert_eq!(a.events().last_seq(), 1);
        assert_eq!(b.events().last_seq(), 0);
    }
}
