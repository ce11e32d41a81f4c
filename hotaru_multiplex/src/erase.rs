//! Deferred-erase sweep: the `3000 ms` grace window between `disconnect(bid)` and the
//! moment the Multiplexer actually frees `bid`'s state (spec.md §3 "DisconnectQueue",
//! §4.6.9 `erase(bid?)`).
//!
//! Grounded on `examples/original_source/src/server/web/http2.cpp`'s `erase()`: a linear
//! scan over `_disconected` comparing `date - i->second >= 3000`, driven both by the
//! pinging timer tick and by direct `erase(bid)` calls. A `BTreeMap` keyed by timestamp
//! then bid is used here instead of the original's unordered map plus full-scan, per
//! Design Notes §9 ("a priority queue keyed by disconnect timestamp") — lookups by bid
//! stay O(log n) and the oldest entries are always the front of the map.

use crate::ids::ConnectionId;
use std::collections::BTreeMap;

/// The window a disconnected bid's state must remain readable before hard removal
/// (spec.md §3, §8 property 4).
pub const DEFERRED_ERASE_MS: u64 = 3000;

/// Tracks disconnected-but-not-yet-erased connections, ordered by disconnect time.
#[derive(Default)]
pub struct DisconnectQueue {
    by_time: BTreeMap<(u64, ConnectionId), ()>,
    by_bid: std::collections::HashMap<ConnectionId, u64>,
}

impl DisconnectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `bid` as disconnected at `now_ms`. Re-enqueuing an already-queued bid
    /// replaces its timestamp (matches the original's plain `map::insert`/overwrite).
    pub fn enqueue(&mut self, bid: ConnectionId, now_ms: u64) {
        if let Some(prev) = self.by_bid.insert(bid, now_ms) {
            self.by_time.remove(&(prev, bid));
        }
        self.by_time.insert((now_ms, bid), ());
    }

    pub fn contains(&self, bid: ConnectionId) -> bool {
        self.by_bid.contains_key(&bid)
    }

    pub fn age_ms(&self, bid: ConnectionId, now_ms: u64) -> Option<u64> {
        self.by_bid.get(&bid).map(|t| now_ms.saturating_sub(*t))
    }

    fn remove(&mut self, bid: ConnectionId) {
        if let Some(t) = self.by_bid.remove(&bid) {
            self.by_time.remove(&(t, bid));
        }
    }

    /// Drains every entry whose age is `>= DEFERRED_ERASE_MS`, in disconnect order (oldest
    /// first — matches the original's forward iteration with erase-in-place). Returns the
    /// bids eligible for hard removal; the caller still owns deep per-protocol cleanup.
    pub fn drain_eligible(&mut self, now_ms: u64) -> Vec<ConnectionId> {
        let mut eligible = Vec::new();
        while let Some((&(t, bid), _)) = self.by_time.iter().next() {
            if now_ms.saturating_sub(t) >= DEFERRED_ERASE_MS {
                eligible.push(bid);
                self.by_time.remove(&(t, bid));
                self.by_bid.remove(&bid);
            } else {
                break;
            }
        }
        eligible
    }

    /// Checks a single bid for eligibility, removing it from the queue if eligible
    /// (spec.md §4.6.9 `erase(bid?)` with an explicit `bid`).
    pub fn take_if_eligible(&mut self, bid: ConnectionId, now_ms: u64) -> bool {
        match self.age_ms(bid, now_ms) {
            Some(age) if age >= DEFERRED_ERASE_MS => {
                self.remove(bid);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.by_bid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_bid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_not_eligible_before_window_elapses() {
        let mut queue = DisconnectQueue::new();
        queue.enqueue(ConnectionId(1), 1_000);
        assert!(queue.drain_eligible(3_500).is_empty());
        assert!(queue.contains(ConnectionId(1)));
    }

    #[test]
    fn entry_eligible_once_window_elapses() {
        let mut queue = DisconnectQueue::new();
        queue.enqueue(ConnectionId(1), 1_000);
        let eligible = queue.drain_eligible(4_000);
        assert_eq!(eligible, vec![ConnectionId(1)]);
        assert!(!queue.contains(ConnectionId(1)));
    }

    #[test]
    fn drain_preserves_disconnect_order() {
        let mut queue = DisconnectQueue::new();
        queue.enqueue(ConnectionId(2), 1_000);
        queue.enqueue(ConnectionId(1), 500);
        let eligible = queue.drain_eligible(10_000);
        assert_eq!(eligible, vec![ConnectionId(1), ConnectionId(2)]);
    }

    #[test]
    fn take_if_eligible_respects_window() {
        let mut queue = DisconnectQueue::new();
        queue.enqueue(ConnectionId(7), 0);
        assert!(!queue.take_if_eligible(ConnectionId(7), 1_000));
        assert!(queue.take_if_eligible(ConnectionId(7), 3_000));
        assert!(!queue.contains(ConnectionId(7)));
    }

    #[test]
    fn re_enqueue_replaces_timestamp() {
        let mut queue = DisconnectQueue::new();
        queue.enqueue(ConnectionId(1), 0);
        queue.enqueue(ConnectionId(1), 5_000);
        assert_eq!(queue.age_ms(ConnectionId(1), 5_500), Some(500));
    }
}
