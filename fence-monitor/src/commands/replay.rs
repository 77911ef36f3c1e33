//! Replay command: dry run over a recorded event file.
//!
//! Nothing is attached to the kernel. Block commands land in the in-memory
//! [`ReplaySource`], and the run ends on its own once every event has
//! been processed.

use fence_bpf::{CancelToken, ReplaySource};
use fence_engine::Logger;
use fence_fs::Filesystem;

use super::session::{build_config, print_banner, run_session, SessionSummary};
use super::CommandResult;
use crate::cli::ReplayArgs;
use crate::clock::Clock;
use crate::io::load_events;

/// Execute the replay command.
///
/// `cancel` still ends the run early (Ctrl+C on a large file).
pub fn execute_replay<F, C, L>(
    args: &ReplayArgs,
    fs: &F,
    clock: &C,
    cancel: &CancelToken,
    logger: &L,
) -> CommandResult<SessionSummary>
where
    F: Filesystem + Clone,
    C: Clock + Clone,
    L: Logger,
{
    let config = build_config(&args.policy, fs)?;
    let events = load_events(fs, &args.events)?;

    print_banner(&config, logger);
    logger.info(&format!(
        "Replaying {} events from {}",
        events.len(),
        args.events.display()
    ));

    let source = ReplaySource::until_drained(events);
    Ok(run_session(
        config,
        args.policy.journal.as_deref(),
        source,
        fs,
        clock,
        cancel,
        logger,
    ))
}
