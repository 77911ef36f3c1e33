//! Per-process violation counts and the blocked set.
//!
//! Both only ever grow: a count is never reset and a blocked pid is never
//! released for the lifetime of a ledger.

use std::collections::{HashMap, HashSet};

use fence_schema::ActorId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationLedger {
    counts: HashMap<ActorId, u32>,
    blocked: HashSet<ActorId>,
}

impl ViolationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one violation for the pid and return its new count.
    pub fn record(&mut self, pid: ActorId) -> u32 {
        let count = self.counts.entry(pid).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Violations recorded for the pid (0 if never seen).
    pub fn count(&self, pid: ActorId) -> u32 {
        self.counts.get(&pid).copied().unwrap_or(0)
    }

    /// Sum of all per-pid counts.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    /// Number of pids with at least one violation.
    pub fn offenders(&self) -> usize {
        self.counts.len()
    }

    /// Add the pid to the blocked set. Returns true only on first insertion.
    pub fn mark_blocked(&mut self, pid: ActorId) -> bool {
        self.blocked.insert(pid)
    }

    pub fn is_blocked(&self, pid: ActorId) -> bool {
        self.blocked.contains(&pid)
    }

    pub fn any_blocked(&self) -> bool {
        !self.blocked.is_empty()
    }

    /// Blocked pids in ascending order.
    pub fn blocked(&self) -> Vec<ActorId> {
        let mut pids: Vec<_> = self.blocked.iter().copied().collect();
        pids.sort_unstable();
        pids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ledger() {
        let ledger = ViolationLedger::new();
        assert_eq!(ledger.count(1), 0);
        assert_eq!(ledger.total(), 0);
        assert_eq!(ledger.offenders(), 0);
        assert!(!ledger.any_blocked());
        assert!(ledger.blocked().is_empty());
    }

    #[test]
    fn test_record_increments_per_pid() {
        let mut ledger = ViolationLedger::new();
        assert_eq!(ledger.record(10), 1);
        assert_eq!(ledger.record(10), 2);
        assert_eq!(ledger.record(20), 1);

        assert_eq!(ledger.count(10), 2);
        assert_eq!(ledger.count(20), 1);
        assert_eq!(ledger.total(), 3);
        assert_eq!(ledger.offenders(), 2);
    }

    #[test]
    fn test_record_saturates() {
        let mut ledger = ViolationLedger::new();
        ledger.counts.insert(1, u32::MAX);
        assert_eq!(ledger.record(1), u32::MAX);
    }

    #[test]
    fn test_total_does_not_overflow_u32() {
        let mut ledger = ViolationLedger::new();
        ledger.counts.insert(1, u32::MAX);
        ledger.counts.insert(2, u32::MAX);
        assert_eq!(ledger.total(), 2 * u64::from(u32::MAX));
    }

    #[test]
    fn test_mark_blocked_once() {
        let mut ledger = ViolationLedger::new();
        assert!(ledger.mark_blocked(5));
        assert!(!ledger.mark_blocked(5));
        assert!(ledger.is_blocked(5));
        assert!(!ledger.is_blocked(6));
        assert!(ledger.any_blocked());
    }

    #[test]
    fn test_blocked_is_sorted() {
        let mut ledger = ViolationLedger::new();
        ledger.mark_blocked(300);
        ledger.mark_blocked(3);
        ledger.mark_blocked(30);
        assert_eq!(ledger.blocked(), vec![3, 30, 300]);
    }

    #[test]
    fn test_blocking_does_not_touch_counts() {
        let mut ledger = ViolationLedger::new();
        ledger.record(1);
        ledger.mark_blocked(1);
        assert_eq!(ledger.record(1), 2);
        assert_eq!(ledger.count(1), 2);
    }
}
