//! Where engine notices go.

use std::sync::{Arc, Mutex, PoisonError};

use fence_schema::Notice;

use crate::logger::Logger;

/// Receives every notice the engine emits, in order.
pub trait NoticeSink: Send + Sync {
    fn emit(&self, notice: &Notice);
}

impl<N: NoticeSink + ?Sized> NoticeSink for &N {
    fn emit(&self, notice: &Notice) {
        (**self).emit(notice);
    }
}

impl<N: NoticeSink + ?Sized> NoticeSink for Arc<N> {
    fn emit(&self, notice: &Notice) {
        (**self).emit(notice);
    }
}

impl<N: NoticeSink> NoticeSink for Option<N> {
    fn emit(&self, notice: &Notice) {
        if let Some(sink) = self {
            sink.emit(notice);
        }
    }
}

/// Prints notices as console lines through a [`Logger`].
#[derive(Debug, Clone)]
pub struct LogSink<L> {
    logger: L,
}

impl<L: Logger> LogSink<L> {
    pub fn new(logger: L) -> Self {
        Self { logger }
    }
}

impl<L: Logger> NoticeSink for LogSink<L> {
    fn emit(&self, notice: &Notice) {
        self.logger.info(&notice.to_string());
    }
}

/// Sends every notice to two sinks.
#[derive(Debug, Clone)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: NoticeSink, B: NoticeSink> NoticeSink for Tee<A, B> {
    fn emit(&self, notice: &Notice) {
        self.0.emit(notice);
        self.1.emit(notice);
    }
}

/// Keeps every notice in memory. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn violations(&self) -> usize {
        self.notices()
            .iter()
            .filter(|n| matches!(n, Notice::Violation { .. }))
            .count()
    }

    /// Pids for which a blocked notice was emitted, in emission order.
    pub fn blocked(&self) -> Vec<u32> {
        self.notices()
            .iter()
            .filter_map(|n| match n {
                Notice::Blocked { pid, .. } => Some(*pid),
                Notice::Violation { .. } => None,
            })
            .collect()
    }
}

impl NoticeSink for RecordingSink {
    fn emit(&self, notice: &Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
    }
}

/// Discards notices.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NoticeSink for NullSink {
    fn emit(&self, _notice: &Notice) {}
}
