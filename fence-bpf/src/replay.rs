//! Deterministic in-memory event source.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use fence_schema::{ActorId, Event};

use crate::cancel::CancelToken;
use crate::source::{EventSource, SourceError};

/// What the source does once every event has been handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exhaustion {
    /// Park until the caller's token is cancelled.
    WaitForCancel,
    /// Cancel the caller's token and report cancellation.
    CancelReader,
}

#[derive(Debug)]
struct ReplayState {
    pending: VecDeque<Event>,
    block_calls: HashMap<ActorId, usize>,
    closed: bool,
    reject_blocks: bool,
}

/// Event source that replays a fixed list of events.
///
/// By default the source parks on the cancellation token once the list is
/// exhausted, so a control loop never spins on an empty source.
/// [`ReplaySource::until_drained`] instead ends the session after the last
/// event, which is what dry runs want.
#[derive(Debug)]
pub struct ReplaySource {
    state: Mutex<ReplayState>,
    exhaustion: Exhaustion,
}

impl ReplaySource {
    /// Replay `events`, then wait for cancellation.
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            state: Mutex::new(ReplayState {
                pending: events.into_iter().collect(),
                block_calls: HashMap::new(),
                closed: false,
                reject_blocks: false,
            }),
            exhaustion: Exhaustion::WaitForCancel,
        }
    }

    /// Replay `events`, then cancel the reader's token.
    pub fn until_drained(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            exhaustion: Exhaustion::CancelReader,
            ..Self::new(events)
        }
    }

    /// Make every `block` call fail, simulating an enforcement map that
    /// cannot be updated.
    pub fn rejecting_blocks(self) -> Self {
        self.lock().reject_blocks = true;
        self
    }

    /// Number of events not yet handed out.
    pub fn remaining(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether `block` has succeeded for the pid.
    pub fn is_blocked(&self, pid: ActorId) -> bool {
        self.block_calls(pid) > 0 && !self.lock().reject_blocks
    }

    /// Number of `block` calls received for the pid, successful or not.
    pub fn block_calls(&self, pid: ActorId) -> usize {
        self.lock().block_calls.get(&pid).copied().unwrap_or(0)
    }

    /// Number of `block` calls received across all pids.
    pub fn total_block_calls(&self) -> usize {
        self.lock().block_calls.values().sum()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, ReplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSource for ReplaySource {
    fn next(&self, cancel: &CancelToken) -> Result<Event, SourceError> {
        {
            let mut state = self.lock();
            if state.closed {
                return Err(SourceError::Closed);
            }
            if cancel.is_cancelled() {
                return Err(SourceError::Cancelled);
            }
            if let Some(event) = state.pending.pop_front() {
                return Ok(event);
            }
        }

        match self.exhaustion {
            Exhaustion::WaitForCancel => cancel.wait(),
            Exhaustion::CancelReader => cancel.cancel(),
        }
        Err(SourceError::Cancelled)
    }

    fn block(&self, pid: ActorId) -> Result<(), SourceError> {
        let mut state = self.lock();
        if state.closed {
            return Err(SourceError::Closed);
        }
        *state.block_calls.entry(pid).or_insert(0) += 1;
        if state.reject_blocks {
            return Err(SourceError::Block {
                pid,
                reason: "enforcement map rejected update".to_string(),
            });
        }
        Ok(())
    }

    fn close(&self) -> Result<(), SourceError> {
        self.lock().closed = true;
        Ok(())
    }
}
