use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Default number of outbound events retained per session for replay.
pub const DEFAULT_LOG_CAPACITY: usize = 256;

/// One outbound event: a serialized notification tagged with its
/// position in the session's event sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub seq: u64,
    pub data: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The requested replay point was trimmed from the log. The client
    /// needs a fresh session; there is no way to close the gap.
    #[error("stream state lost: events before {first_retained} are no longer retained")]
    StateLost { first_retained: u64 },
}

struct Inner {
    next_seq: u64,
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

/// Append-only, sequence-numbered log of a session's outbound events.
///
/// Producers (mutation handling) append under a short lock and fan out to
/// live subscribers over a broadcast channel; a slow or absent stream
/// consumer never blocks an append. Retention is bounded: once `capacity`
/// is exceeded the oldest entries are dropped and replay from before the
/// retained window fails with [`ReplayError::StateLost`].
pub struct EventLog {
    inner: Mutex<Inner>,
    tx: broadcast::Sender<LogEntry>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(16));
        Self {
            inner: Mutex::new(Inner {
                next_seq: 1,
                entries: VecDeque::new(),
                capacity,
            }),
            tx,
        }
    }

    /// Append an event and deliver it to live subscribers.
    /// Returns the sequence number assigned to the event.
    pub fn append(&self, data: impl Into<String>) -> u64 {
        let entry = {
            let mut inner = self.inner.lock();
            let entry = LogEntry {
                seq: inner.next_seq,
                data: data.into(),
            };
            inner.next_seq += 1;
            inner.entries.push_back(entry.clone());
            while inner.entries.len() > inner.capacity {
                let _ = inner.entries.pop_front();
            }
            entry
        };
        let seq = entry.seq;
        // No receiver connected is fine; the log is the source of truth.
        let _ = self.tx.send(entry);
        seq
    }

    /// Atomically snapshot the events strictly after `last_seen` and open
    /// a live subscription positioned right after the snapshot.
    ///
    /// `last_seen = None` requests a fresh stream with no replay. Both the
    /// snapshot and the subscription happen under the same lock as
    /// `append`, so the pair has no gap and no duplicates: every event is
    /// either in the snapshot or will arrive on the receiver.
    pub fn replay_after(
        &self,
        last_seen: Option<u64>,
    ) -> Result<(Vec<LogEntry>, broadcast::Receiver<LogEntry>), ReplayError> {
        let inner = self.inner.lock();
        let rx = self.tx.subscribe();

        let Some(last_seen) = last_seen else {
            return Ok((Vec::new(), rx));
        };

        let first_retained = inner
            .entries
            .front()
            .map(|e| e.seq)
            .unwrap_or(inner.next_seq);

        // `last_seen` comes straight off the wire; saturate so u64::MAX
        // cannot overflow the bound check.
        if last_seen.saturating_add(1) < first_retained {
            return Err(ReplayError::StateLost { first_retained });
        }

        let replay = inner
            .entries
            .iter()
            .filter(|e| e.seq > last_seen)
            .cloned()
            .collect();
        Ok((replay, rx))
    }

    /// Sequence number of the most recent event, or 0 if none yet.
    pub fn last_seq(&self) -> u64 {
        self.inner.lock().next_seq - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_monotonic_from_one() {
        let log = EventLog::new(16);
        assert_eq!(log.append("a"), 1);
        assert_eq!(log.append("b"), 2);
        assert_eq!(log.append("c"), 3);
        assert_eq!(log.last_seq(), 3);
    }

    #[test]
    fn replay_after_returns_strictly_later_events() {
        let log = EventLog::new(16);
        for s in ["e1", "e2", "e3", "e4", "e5"] {
            let _ = log.append(s);
        }

        let (replay, _rx) = log.replay_after(Some(3)).unwrap();
        let seqs: Vec<u64> = replay.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![4, 5]);
        assert_eq!(replay[0].data, "e4");
        assert_eq!(replay[1].data, "e5");
    }

    #[test]
    fn replay_without_last_seen_is_live_only() {
        let log = EventLog::new(16);
        let _ = log.append("old");
        let (replay, _rx) = log.replay_after(None).unwrap();
        assert!(replay.is_empty());
    }

    #[test]
    fn replay_from_current_tip_is_empty() {
        let log = EventLog::new(16);
        let _ = log.append("a");
        let (replay, _rx) = log.replay_after(Some(1)).unwrap();
        assert!(replay.is_empty());
    }

    #[test]
    fn trimmed_replay_point_is_state_lost() {
        let log = EventLog::new(3);
        for _ in 0..10 {
            let _ = log.append("x");
        }
        // Events 1..=7 were trimmed; asking for "after 2" needs event 3.
        let err = log.replay_after(Some(2)).unwrap_err();
        assert!(matches!(err, ReplayError::StateLost { first_retained: 8 }));

        // The retained window itself still replays.
        let (replay, _rx) = log.replay_after(Some(7)).unwrap();
        assert_eq!(replay.len(), 3);
    }

    #[test]
    fn capacity_bounds_retention() {
        let log = EventLog::new(4);
        for _ in 0..100 {
            let _ = log.append("x");
        }
        assert_eq!(log.last_seq(), 100);
        // Only the 4 newest events survive.
        let (replay, _rx) = log.replay_after(Some(96)).unwrap();
        let seqs: Vec<u64> = replay.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![97, 98, 99, 100]);
    }

    #[test]
    fn replay_from_max_sequence_is_empty_not_overflow() {
        let log = EventLog::new(4);
        let _ = log.append("a");
        // A reconnect may claim any u64 it likes; a claim past the tip
        // must come back as an empty replay, never a panic.
        let (replay, _rx) = log.replay_after(Some(u64::MAX)).unwrap();
        assert!(replay.is_empty());

        let empty = EventLog::new(4);
        let (replay, _rx) = empty.replay_after(Some(u64::MAX)).unwrap();
        assert!(replay.is_empty());
    }

    #[tokio::test]
    async fn live_subscription_sees_appends_after_snapshot() {
        let log = EventLog::new(16);
        let _ = log.append("before");

        let (replay, mut rx) = log.replay_after(Some(1)).unwrap();
        assert!(replay.is_empty());

        let _ = log.append("after");
        let entry = rx.recv().await.unwrap();
        assert_eq!(entry.seq, 2);
        assert_eq!(entry.data, "after");
    }

    #[tokio::test]
    async fn no_duplicates_between_replay_and_live() {
        let log = EventLog::new(16);
        let _ = log.append("e1");
        let _ = log.append("e2");

        let (replay, mut rx) = log.replay_after(Some(0)).unwrap();
        assert_eq!(replay.len(), 2);

        let _ = log.append("e3");
        let entry = rx.recv().await.unwrap();
        assert_eq!(entry.seq, 3);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn append_without_subscribers_does_not_block() {
        let log = EventLog::new(16);
        for _ in 0..1000 {
            let _ = log.append("noop");
        }
        assert_eq!(log.last_seq(), 1000);
    }
}
