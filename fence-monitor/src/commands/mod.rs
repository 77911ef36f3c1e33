//! Command orchestration for CLI subcommands.
//!
//! Provides execute functions for:
//! - `watch` - Enforce against live kernel events
//! - `replay` - Dry run over a recorded event file

pub mod replay;
mod session;
pub mod watch;

pub use replay::execute_replay;
pub use session::SessionSummary;
pub use watch::execute_watch;

use fence_bpf::BpfError;
use fence_engine::ConfigError;
use thiserror::Error;

use crate::cli::CliError;
use crate::io::{PatternLoadError, ReplayLoadError};

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("pattern file error: {0}")]
    Patterns(#[from] PatternLoadError),

    #[error("replay file error: {0}")]
    Replay(#[from] ReplayLoadError),

    #[error("BPF error: {0}")]
    Bpf(#[from] BpfError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;
