//! Watch command: enforce against live open events until interrupted.

use fence_bpf::{BpfError, CancelToken, EventSource};
use fence_engine::Logger;
use fence_fs::Filesystem;

use super::session::{build_config, print_banner, run_session, SessionSummary};
use super::CommandResult;
use crate::cli::WatchArgs;
use crate::clock::Clock;

/// Execute the watch command.
///
/// The policy is validated before `open` is called, so a bad flag never
/// loads anything into the kernel. Runs until `cancel` fires.
pub fn execute_watch<S, O, F, C, L>(
    args: &WatchArgs,
    open: O,
    fs: &F,
    clock: &C,
    cancel: &CancelToken,
    logger: &L,
) -> CommandResult<SessionSummary>
where
    S: EventSource,
    O: FnOnce() -> Result<S, BpfError>,
    F: Filesystem + Clone,
    C: Clock + Clone,
    L: Logger,
{
    let config = build_config(&args.policy, fs)?;
    let source = open()?;

    print_banner(&config, logger);
    logger.info("Press Ctrl+C to stop");

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
