//! CLI argument parsing for fence.
//!
//! Provides the `watch` and `replay` subcommands of the `fence` binary.
//! Both share the policy flags in [`PolicyArgs`].

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use thiserror::Error;

/// Default number of violations before a process is blocked.
pub const DEFAULT_THRESHOLD: u32 = 2;

/// Target pid meaning "every process".
pub const ALL_PIDS: u32 = 0;

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("no disallowed patterns given (use --disallowed or --patterns-file)")]
    NoPatterns,

    #[error("threshold must be at least 1, got {0}")]
    InvalidThreshold(u32),
}

/// fence - block processes that keep opening disallowed files.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "fence")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase output verbosity (-v verbose, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Attach to the kernel and block offenders until interrupted.
    Watch(WatchArgs),
    /// Feed a recorded JSON-lines event file through the engine (dry run).
    Replay(ReplayArgs),
}

/// Policy flags shared by every command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PolicyArgs {
    /// Comma-separated disallowed patterns (globs or substrings),
    /// e.g. "/etc/shadow,/root/*,.ssh".
    #[arg(short, long)]
    pub disallowed: Option<String>,

    /// File with one disallowed pattern per line. Appended after --disallowed.
    #[arg(long)]
    pub patterns_file: Option<PathBuf>,

    /// Violations before a process is blocked.
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: u32,

    /// Only watch this pid (0 = all processes).
    #[arg(long, default_value_t = ALL_PIDS)]
    pub pid: u32,

    /// Append every notice as a JSON line to this file.
    #[arg(long)]
    pub journal: Option<PathBuf>,
}

impl PolicyArgs {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.threshold == 0 {
            return Err(CliError::InvalidThreshold(self.threshold));
        }
        if self.patterns_file.is_none() && self.cli_patterns().is_empty() {
            return Err(CliError::NoPatterns);
        }
        Ok(())
    }

    /// Patterns given on the command line, in order.
    pub fn cli_patterns(&self) -> Vec<String> {
        self.disallowed
            .as_deref()
            .map(split_patterns)
            .unwrap_or_default()
    }
}

/// Arguments for the watch command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct WatchArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// Arguments for the replay command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ReplayArgs {
    /// JSON-lines file of events, one `{"pid","uid","comm","path","flags"}` object per line.
    #[arg(short, long)]
    pub events: PathBuf,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// Split a comma-separated pattern list, trimming whitespace and dropping
/// empty entries.
pub fn split_patterns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse CLI arguments from an iterator (for testing).
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}
