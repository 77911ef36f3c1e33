//! fence CLI.
//!
//! Argument parsing, signal wiring, pattern and replay file loading, the
//! notice journal, and the `watch` / `replay` commands that drive the
//! decision engine.

pub mod cli;
pub mod clock;
pub mod commands;
pub mod exit;
pub mod io;
pub mod signal;

pub use cli::{parse_from, split_patterns, Cli, CliError, Command, PolicyArgs, ReplayArgs, WatchArgs};
pub use clock::{Clock, FixedClock, SystemClock};
pub use commands::{execute_replay, execute_watch, CommandError, CommandResult, SessionSummary};
pub use signal::install_handler;
