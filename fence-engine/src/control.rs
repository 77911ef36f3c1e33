//! Control loop orchestration.
//!
//! Reads events from the engine's source and feeds them to
//! [`DecisionEngine::process`] until the cancellation token fires:
//! - cancellation (before a read or reported by it) ends the loop cleanly
//! - any other read error is logged and the loop reads again, with no
//!   backoff and no error budget
//! - processing errors are logged and the loop carries on

use fence_bpf::{CancelToken, EventSource};

use crate::engine::DecisionEngine;
use crate::logger::Logger;
use crate::sink::NoticeSink;

/// Counters for one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Events read from the source.
    pub events: u64,
    /// Reads that failed for a reason other than cancellation.
    pub read_errors: u64,
    /// Events whose processing returned an error.
    pub process_errors: u64,
}

/// Drives a [`DecisionEngine`] from its event source.
pub struct ControlLoop<'a, S, N, L> {
    engine: &'a DecisionEngine<S, N>,
    logger: &'a L,
}

impl<'a, S, N, L> ControlLoop<'a, S, N, L>
where
    S: EventSource,
    N: NoticeSink,
    L: Logger,
{
    pub fn new(engine: &'a DecisionEngine<S, N>, logger: &'a L) -> Self {
        Self { engine, logger }
    }

    /// Run until `cancel` fires.
    ///
    /// Cancellation is the only way out, and it is not an error: the
    /// returned stats describe a clean shutdown.
    pub fn run(&self, cancel: &CancelToken) -> RunStats {
        let mut stats = RunStats::default();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let event = match self.engine.source().next(cancel) {
                Ok(event) => event,
                Err(e) if e.is_cancelled() => break,
                Err(e) => {
                    stats.read_errors += 1;
                    self.logger.warn(&format!("reading event: {}", e));
                    continue;
                }
            };
            stats.events += 1;

            self.logger.debug(&format!(
                "open pid={} uid={} comm={} path={} flags={:#o}",
                event.pid, event.uid, event.comm, event.path, event.flags
            ));

            if let Err(e) = self.engine.process(&event) {
                stats.process_errors += 1;
                self.logger.warn(&format!("processing event: {}", e));
            }
        }

        self.logger.verbose(&format!(
            "control loop stopped: events={} read_errors={} process_errors={}",
            stats.events, stats.read_errors, stats.process_errors
        ));
        stats
    }
}
