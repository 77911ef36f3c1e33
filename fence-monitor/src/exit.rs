//! Exit codes for the fence CLI.

use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Clean shutdown.
    pub const SUCCESS: i32 = 0;
    /// Invalid arguments or configuration.
    pub const INVALID_ARGS: i32 = 1;
    /// Pattern file could not be read.
    pub const PATTERNS_ERROR: i32 = 2;
    /// Replay file could not be read or parsed.
    pub const REPLAY_ERROR: i32 = 3;
    /// BPF programs could not be loaded or attached.
    pub const BPF_ERROR: i32 = 4;
    /// Signal handler could not be installed.
    pub const SIGNAL_ERROR: i32 = 5;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> i32 {
    match error {
        CommandError::InvalidArgument(_) | CommandError::Config(_) => codes::INVALID_ARGS,
        CommandError::Patterns(_) => codes::PATTERNS_ERROR,
        CommandError::Replay(_) => codes::REPLAY_ERROR,
        CommandError::Bpf(_) => codes::BPF_ERROR,
        CommandError::Signal(_) => codes::SIGNAL_ERROR,
    }
}
