//! The event source contract.
//!
//! An [`EventSource`] supplies decoded open events and executes block
//! commands. The production implementation sits on top of the BPF ring
//! buffer; [`crate::ReplaySource`] replays a fixed list for tests.

use std::sync::Arc;

use fence_schema::{ActorId, Event};
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::record::RecordError;

/// Errors from event source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The cancellation token fired while waiting. Not a failure.
    #[error("operation cancelled")]
    Cancelled,

    #[error("event source is closed")]
    Closed,

    #[error("failed to read event: {0}")]
    Read(String),

    #[error("failed to decode event: {0}")]
    Decode(#[from] RecordError),

    #[error("failed to block pid {pid}: {reason}")]
    Block { pid: ActorId, reason: String },
}

impl SourceError {
    /// True for the clean-shutdown outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SourceError::Cancelled)
    }
}

/// Errors bringing up the BPF program.
#[derive(Debug, Error)]
pub enum BpfError {
    #[error("failed to load BPF program: {0}")]
    Load(String),

    #[error("failed to attach {program}: {reason}")]
    Attach { program: String, reason: String },

    #[error("insufficient permissions (requires root or CAP_BPF + CAP_MAC_ADMIN)")]
    InsufficientPermissions,

    #[error("failed to open ring buffer: {0}")]
    RingBuffer(String),

    #[error("fence was built without BPF support (enable the `bpf` feature)")]
    Unsupported,
}

/// Pull interface to the capture/enforcement subsystem.
pub trait EventSource {
    /// Block until an event is available, `cancel` fires, or an error occurs.
    ///
    /// Must return [`SourceError::Cancelled`] once `cancel` fires, and must
    /// park rather than spin when there is nothing to read.
    fn next(&self, cancel: &CancelToken) -> Result<Event, SourceError>;

    /// Deny the process any further opens. Redundant calls are tolerated.
    fn block(&self, pid: ActorId) -> Result<(), SourceError>;

    /// Release resources. Every later operation fails with
    /// [`SourceError::Closed`].
    fn close(&self) -> Result<(), SourceError>;
}

impl<S: EventSource + ?Sized> EventSource for &S {
    fn next(&self, cancel: &CancelToken) -> Result<Event, SourceError> {
        (**self).next(cancel)
    }

    fn block(&self, pid: ActorId) -> Result<(), SourceError> {
        (**self).block(pid)
    }

    fn close(&self) -> Result<(), SourceError> {
        (**self).close()
    }
}

impl<S: EventSource + ?Sized> EventSource for Arc<S> {
    fn next(&self, cancel: &CancelToken) -> Result<Event, SourceError> {
        (**self).next(cancel)
    }

    fn block(&self, pid: ActorId) -> Result<(), SourceError> {
        (**self).block(pid)
    }

    fn close(&self) -> Result<(), SourceError> {
        (**self).close()
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn next(&self, cancel: &CancelToken) -> Result<Event, SourceError> {
        (**self).next(cancel)
    }

    fn block(&self, pid: ActorId) -> Result<(), SourceError> {
        (**self).block(pid)
    }

    fn close(&self) -> Result<(), SourceError> {
        (**self).close()
    }
}
