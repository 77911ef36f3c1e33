//! Replay event file loader.
//!
//! One JSON [`Event`] per line:
//!
//! ```text
//! {"pid":1234,"uid":1000,"comm":"cat","path":"/etc/shadow","flags":0}
//! ```
//!
//! `flags` may be omitted. Blank lines and lines starting with # are
//! skipped. `comm` and `path` are cut to the capture buffer sizes, the same
//! as live events.

use std::path::Path;

use fence_fs::{Filesystem, FsError};
use fence_schema::Event;
use thiserror::Error;

/// Errors from replay file loading.
#[derive(Debug, Error)]
pub enum ReplayLoadError {
    #[error("failed to read event file: {0}")]
    Read(#[from] FsError),

    #[error("invalid event on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Load all events from a replay file.
pub fn load_events<F: Filesystem>(fs: &F, path: &Path) -> Result<Vec<Event>, ReplayLoadError> {
    let content = fs.read_file(path)?;
    parse_events(&content)
}

/// Parse replay file content.
pub fn parse_events(content: &str) -> Result<Vec<Event>, ReplayLoadError> {
    let mut events = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let raw: Event = serde_json::from_str(trimmed).map_err(|e| ReplayLoadError::Parse {
            line: line_num + 1,
            source: e,
        })?;
        events.push(Event::new(raw.pid, raw.uid, &raw.comm, &raw.path).with_flags(raw.flags));
    }

    Ok(events)
}
