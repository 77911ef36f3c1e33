//! Shared plumbing for a single engine run: policy assembly, the startup
//! banner, the control loop and the shutdown summary.

use std::path::Path;

use fence_bpf::{CancelToken, EventSource};
use fence_engine::{
    ControlLoop, DecisionEngine, EngineConfig, LogSink, Logger, Policy, RunStats, TargetFilter,
    Tee,
};
use fence_fs::Filesystem;
use fence_schema::ActorId;

use super::CommandResult;
use crate::cli::{CliError, PolicyArgs};
use crate::clock::Clock;
use crate::io::{load_patterns, JournalWriter};

/// What a finished run leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub stats: RunStats,
    pub total_violations: u64,
    /// Pids with at least one violation.
    pub offenders: usize,
    /// Blocked pids, ascending.
    pub blocked: Vec<ActorId>,
}

/// Validate the policy flags and build the engine configuration.
///
/// Pattern-file entries follow the `--disallowed` entries.
pub(crate) fn build_config<F: Filesystem>(args: &PolicyArgs, fs: &F) -> CommandResult<EngineConfig> {
    args.validate()?;

    let mut patterns = args.cli_patterns();
    if let Some(path) = &args.patterns_file {
        patterns.extend(load_patterns(fs, path)?);
    }
    if patterns.is_empty() {
        return Err(CliError::NoPatterns.into());
    }

    let config = EngineConfig::new(
        Policy::new(patterns),
        args.threshold,
        TargetFilter::from_raw(args.pid),
    )?;
    Ok(config)
}

pub(crate) fn print_banner<L: Logger>(config: &EngineConfig, logger: &L) {
    let patterns: Vec<&str> = config.policy().patterns().collect();
    logger.info(&format!("Disallowed files: {:?}", patterns));
    logger.info(&format!("Threshold: {} file(s)", config.threshold()));
    if let TargetFilter::Actor(pid) = config.target() {
        logger.info(&format!("Target PID: {}", pid));
    }
}

/// Run the engine over `source` until `cancel` fires, then close the
/// source and report.
pub(crate) fn run_session<S, F, C, L>(
    config: EngineConfig,
    journal: Option<&Path>,
    source: S,
    fs: &F,
    clock: &C,
    cancel: &CancelToken,
    logger: &L,
) -> SessionSummary
where
    S: EventSource,
    F: Filesystem + Clone,
    C: Clock + Clone,
    L: Logger,
{
    let journal = journal.map(|path| {
        logger.verbose(&format!("Journal: {}", path.display()));
        JournalWriter::new(fs.clone(), path.to_path_buf(), clock.clone(), logger)
    });
    let sink = Tee(LogSink::new(logger), journal);
    let engine = DecisionEngine::new(source, config, sink);

    let stats = ControlLoop::new(&engine, logger).run(cancel);

    logger.info("Exiting...");
    if let Err(e) = engine.source().close() {
        logger.warn(&format!("closing event source: {}", e));
    }

    let ledger = engine.snapshot();
    let summary = SessionSummary {
        stats,
        total_violations: ledger.total(),
        offenders: ledger.offenders(),
        blocked: ledger.blocked(),
    };
    logger.info(&format!(
        "Total violations: {} from {} process(es)",
        summary.total_violations, summary.offenders
    ));
    if summary.blocked.is_empty() {
        logger.info("Blocked PIDs: none");
    } else {
        logger.info(&format!("Blocked PIDs: {:?}", summary.blocked));
    }
    summary
}
