//! Pattern file loader.
//!
//! Format:
//! - One pattern per line, surrounding whitespace trimmed
//! - Lines starting with # are comments
//! - Empty lines are ignored

use std::path::Path;

use fence_fs::{Filesystem, FsError};
use thiserror::Error;

/// Errors from pattern file loading.
#[derive(Debug, Error)]
pub enum PatternLoadError {
    #[error("failed to read pattern file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: FsError,
    },
}

/// Load patterns from a file, in file order.
pub fn load_patterns<F: Filesystem>(fs: &F, path: &Path) -> Result<Vec<String>, PatternLoadError> {
    let content = fs.read_file(path).map_err(|source| PatternLoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_patterns(&content))
}

/// Parse pattern file content.
pub fn parse_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
