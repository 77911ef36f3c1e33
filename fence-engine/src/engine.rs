//! The decision engine.
//!
//! Per-process states: unseen -> violating (1 <= count < threshold) ->
//! blocked (count >= threshold, block command issued). Processing happens on
//! one thread; the ledger sits behind a mutex so the query methods can be
//! called from other threads while the control loop runs.

use std::sync::{Mutex, MutexGuard, PoisonError};

use fence_bpf::{EventSource, SourceError};
use fence_schema::{ActorId, Event, Notice};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::ledger::ViolationLedger;
use crate::sink::NoticeSink;

/// Errors from processing an event.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The block command failed. The pid stays marked as blocked locally.
    #[error("failed to block pid {pid}: {source}")]
    Block {
        pid: ActorId,
        #[source]
        source: SourceError,
    },
}

/// Why an event left no trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The pid is not the configured target.
    NotTargeted,
    /// The path matched no disallowed pattern.
    Allowed,
}

/// What `process` did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ignored(IgnoreReason),
    /// A violation was counted; `count` is the pid's new total.
    Violation { count: u32 },
    /// A violation was counted and the pid was blocked by this event.
    Blocked { count: u32 },
}

/// One monitoring session's decision state.
pub struct DecisionEngine<S, N> {
    source: S,
    config: EngineConfig,
    sink: N,
    ledger: Mutex<ViolationLedger>,
}

impl<S: EventSource, N: NoticeSink> DecisionEngine<S, N> {
    pub fn new(source: S, config: EngineConfig, sink: N) -> Self {
        Self {
            source,
            config,
            sink,
            ledger: Mutex::new(ViolationLedger::new()),
        }
    }

    /// Classify one event and update the ledger.
    ///
    /// When this event takes the pid to the threshold for the first time the
    /// pid is added to the blocked set *before* the block command runs. If
    /// the command fails the error is returned but the pid stays blocked in
    /// the ledger, and no blocked notice is emitted.
    pub fn process(&self, event: &Event) -> Result<Outcome, EngineError> {
        if !self.config.target().admits(event.pid) {
            return Ok(Outcome::Ignored(IgnoreReason::NotTargeted));
        }
        if !self.config.policy().matches(&event.path) {
            return Ok(Outcome::Ignored(IgnoreReason::Allowed));
        }

        let threshold = self.config.threshold();
        let (count, crossed) = {
            let mut ledger = self.ledger();
            let count = ledger.record(event.pid);
            let crossed = count >= threshold && ledger.mark_blocked(event.pid);
            (count, crossed)
        };

        self.sink.emit(&Notice::Violation {
            pid: event.pid,
            comm: event.comm.clone(),
            path: event.path.clone(),
            count,
            threshold,
        });

        if !crossed {
            return Ok(Outcome::Violation { count });
        }

        self.source
            .block(event.pid)
            .map_err(|source| EngineError::Block {
                pid: event.pid,
                source,
            })?;

        self.sink.emit(&Notice::Blocked {
            pid: event.pid,
            comm: event.comm.clone(),
            count,
        });

        Ok(Outcome::Blocked { count })
    }

    /// Sum of all per-pid violation counts.
    pub fn total_violations(&self) -> u64 {
        self.ledger().total()
    }

    /// Violations recorded for the pid (0 if never seen).
    pub fn violation_count(&self, pid: ActorId) -> u32 {
        self.ledger().count(pid)
    }

    /// Whether any pid has been blocked.
    pub fn any_blocked(&self) -> bool {
        self.ledger().any_blocked()
    }

    pub fn is_blocked(&self, pid: ActorId) -> bool {
        self.ledger().is_blocked(pid)
    }

    /// Blocked pids in ascending order.
    pub fn blocked_pids(&self) -> Vec<ActorId> {
        self.ledger().blocked()
    }

    /// Copy of the ledger taken under the lock.
    pub fn snapshot(&self) -> ViolationLedger {
        self.ledger().clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn ledger(&self) -> MutexGuard<'_, ViolationLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetFilter;
    use crate::matcher::Policy;
    use crate::sink::RecordingSink;
    use fence_bpf::ReplaySource;

    fn config(patterns: &[&str], threshold: u32, target: TargetFilter) -> EngineConfig {
        EngineConfig::new(Policy::new(patterns.iter().copied()), threshold, target)
            .expect("config")
    }

    fn engine(
        threshold: u32,
        target: TargetFilter,
    ) -> (DecisionEngine<ReplaySource, RecordingSink>, RecordingSink) {
        let sink = RecordingSink::new();
        let engine = DecisionEngine::new(
            ReplaySource::new(Vec::new()),
            config(&["/etc/*"], threshold, target),
            sink.clone(),
        );
        (engine, sink)
    }

    fn open(pid: u32, path: &str) -> Event {
        Event::new(pid, 1000, "cat", path)
    }

    // ===========================================
    // Filtering and classification
    // ===========================================

    #[test]
    fn test_allowed_path_is_ignored() {
        let (engine, sink) = engine(2, TargetFilter::All);
        let outcome = engine.process(&open(1, "/home/safe.txt")).unwrap();

        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::Allowed));
        assert_eq!(engine.total_violations(), 0);
        assert!(sink.notices().is_empty());
    }

    #[test]
    fn test_untargeted_pid_is_ignored_even_if_disallowed() {
        let (engine, sink) = engine(1, TargetFilter::Actor(1000));
        let outcome = engine.process(&open(2000, "/etc/passwd")).unwrap();

        assert_eq!(outcome, Outcome::Ignored(IgnoreReason::NotTargeted));
        assert_eq!(engine.violation_count(2000), 0);
        assert!(!engine.is_blocked(2000));
        assert_eq!(engine.source().total_block_calls(), 0);
        assert!(sink.notices().is_empty());
    }

    #[test]
    fn test_targeted_pid_is_counted() {
        let (engine, _) = engine(5, TargetFilter::Actor(1000));
        let outcome = engine.process(&open(1000, "/etc/passwd")).unwrap();
        assert_eq!(outcome, Outcome::Violation { count: 1 });
    }

    // ===========================================
    // Threshold and blocking
    // ===========================================

    #[test]
    fn test_violation_notice_carries_count_and_path() {
        let (engine, sink) = engine(3, TargetFilter::All);
        engine.process(&open(7, "/etc/shadow")).unwrap();

        assert_eq!(
            sink.notices(),
            vec![Notice::Violation {
                pid: 7,
                comm: "cat".to_string(),
                path: "/etc/shadow".to_string(),
                count: 1,
                threshold: 3,
            }]
        );
    }

    #[test]
    fn test_blocks_when_threshold_reached() {
        let (engine, sink) = engine(2, TargetFilter::All);

        assert_eq!(
            engine.process(&open(1234, "/etc/passwd")).unwrap(),
            Outcome::Violation { count: 1 }
        );
        assert!(!engine.is_blocked(1234));

        assert_eq!(
            engine.process(&open(1234, "/etc/shadow")).unwrap(),
            Outcome::Blocked { count: 2 }
        );
        assert!(engine.is_blocked(1234));
        assert!(engine.any_blocked());
        assert_eq!(engine.source().block_calls(1234), 1);
        assert_eq!(sink.blocked(), vec![1234]);
    }

    #[test]
    fn test_threshold_one_blocks_on_first_violation() {
        let (engine, _) = engine(1, TargetFilter::All);
        assert_eq!(
            engine.process(&open(5, "/etc/hosts")).unwrap(),
            Outcome::Blocked { count: 1 }
        );
    }

    #[test]
    fn test_block_issued_once_and_counting_continues() {
        let (engine, sink) = engine(2, TargetFilter::All);
        for _ in 0..5 {
            engine.process(&open(9, "/etc/passwd")).unwrap();
        }

        assert_eq!(engine.violation_count(9), 5);
        assert_eq!(engine.source().block_calls(9), 1);
        assert_eq!(sink.blocked(), vec![9]);
        assert_eq!(sink.violations(), 5);
    }

    #[test]
    fn test_failed_block_still_marks_pid_blocked() {
        let sink = RecordingSink::new();
        let engine = DecisionEngine::new(
            ReplaySource::new(Vec::new()).rejecting_blocks(),
            config(&["/etc/*"], 1, TargetFilter::All),
            sink.clone(),
        );

        let err = engine.process(&open(3, "/etc/passwd")).unwrap_err();
        assert!(matches!(err, EngineError::Block { pid: 3, .. }));
        assert!(err.to_string().contains("failed to block pid 3"));

        assert!(engine.is_blocked(3));
        assert!(sink.blocked().is_empty());

        // no retry on later events
        engine.process(&open(3, "/etc/passwd")).unwrap();
        assert_eq!(engine.source().block_calls(3), 1);
        assert_eq!(engine.violation_count(3), 2);
    }

    #[test]
    fn test_block_on_closed_source_is_an_error() {
        let (engine, _) = engine(1, TargetFilter::All);
        engine.source().close().unwrap();

        let err = engine.process(&open(3, "/etc/passwd")).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Block {
                source: SourceError::Closed,
                ..
            }
        ));
        assert!(engine.is_blocked(3));
    }

    // ===========================================
    // Queries
    // ===========================================

    #[test]
    fn test_queries_on_fresh_engine() {
        let (engine, _) = engine(2, TargetFilter::All);
        assert_eq!(engine.total_violations(), 0);
        assert_eq!(engine.violation_count(1), 0);
        assert!(!engine.any_blocked());
        assert!(engine.blocked_pids().is_empty());
    }

    #[test]
    fn test_total_is_sum_of_per_pid_counts() {
        let (engine, _) = engine(10, TargetFilter::All);
        let events = [(1, "/etc/a"), (2, "/etc/b"), (1, "/tmp/c"), (3, "/etc/d"), (1, "/etc/e")];
        for (pid, path) in events {
            engine.process(&open(pid, path)).unwrap();
        }

        let snapshot = engine.snapshot();
        assert_eq!(engine.violation_count(1), 2);
        assert_eq!(engine.violation_count(2), 1);
        assert_eq!(engine.violation_count(3), 1);
        assert_eq!(engine.total_violations(), 4);
        assert_eq!(snapshot.total(), 4);
        assert_eq!(snapshot.offenders(), 3);
    }

    #[test]
    fn test_blocked_pids_sorted() {
        let (engine, _) = engine(1, TargetFilter::All);
        for pid in [30, 10, 20] {
            engine.process(&open(pid, "/etc/passwd")).unwrap();
        }
        assert_eq!(engine.blocked_pids(), vec![10, 20, 30]);
    }
}
