//! Append-only notice journal.
//!
//! Every notice the engine emits becomes one JSON line:
//!
//! ```text
//! {"ts":"2024-03-01T12:30:05Z","kind":"violation","pid":42,"comm":"cat","path":"/etc/shadow","count":1,"threshold":2}
//! {"ts":"2024-03-01T12:30:06Z","kind":"blocked","pid":42,"comm":"cat","count":2}
//! ```
//!
//! The journal is a side channel. A failed append is logged and the
//! engine carries on.

use std::path::{Path, PathBuf};

use fence_engine::{Logger, NoticeSink};
use fence_fs::{Filesystem, FsError};
use fence_schema::Notice;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Clock;

/// Errors from journal writing.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("failed to append to journal: {0}")]
    Append(#[source] FsError),

    #[error("failed to encode journal entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One journal line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// RFC 3339 time the notice was written.
    pub ts: String,

    #[serde(flatten)]
    pub notice: Notice,
}

impl JournalEntry {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Writes notices to a JSON-lines file.
pub struct JournalWriter<F, C, L> {
    fs: F,
    path: PathBuf,
    clock: C,
    logger: L,
}

impl<F: Filesystem, C: Clock, L: Logger> JournalWriter<F, C, L> {
    pub fn new(fs: F, path: PathBuf, clock: C, logger: L) -> Self {
        Self {
            fs,
            path,
            clock,
            logger,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one notice, stamped with the current time.
    pub fn append(&self, notice: &Notice) -> Result<(), JournalError> {
        let entry = JournalEntry {
            ts: self.clock.timestamp(),
            notice: notice.clone(),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        self.fs
            .append(&self.path, line.as_bytes())
            .map_err(JournalError::Append)
    }
}

impl<F: Filesystem, C: Clock, L: Logger> NoticeSink for JournalWriter<F, C, L> {
    fn emit(&self, notice: &Notice) {
        if let Err(e) = self.append(notice) {
            self.logger
                .warn(&format!("journal {}: {}", self.path.display(), e));
        }
    }
}
