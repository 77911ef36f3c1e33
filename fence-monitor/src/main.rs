//! fence CLI binary.
//!
//! Entry point for the `fence` command-line tool.

use std::process::ExitCode;

use clap::Parser;
use fence_bpf::CancelToken;
use fence_engine::{StderrLogger, Verbosity};
use fence_fs::RealFilesystem;
use fence_monitor::exit::{codes, exit_code};
use fence_monitor::{
    execute_replay, install_handler, Cli, Command, CommandError, ReplayArgs, SessionSummary,
    SystemClock, WatchArgs,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logger = StderrLogger::new(Verbosity::from_count(cli.verbose));

    let cancel = CancelToken::new();
    let result = install_handler(&cancel)
        .map_err(CommandError::from)
        .and_then(|()| match &cli.command {
            Command::Watch(args) => run_watch(args, &cancel, &logger),
            Command::Replay(args) => run_replay(args, &cancel, &logger),
        });

    match result {
        Ok(_) => ExitCode::from(codes::SUCCESS as u8),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}

/// Run the watch command against the kernel.
#[cfg(feature = "bpf")]
fn run_watch(
    args: &WatchArgs,
    cancel: &CancelToken,
    logger: &StderrLogger,
) -> Result<SessionSummary, CommandError> {
    use fence_bpf::{BpfError, BpfEventSource};
    use fence_engine::Logger;
    use std::mem::MaybeUninit;

    let mut object = MaybeUninit::uninit();
    let object = &mut object;
    let open = move || -> Result<_, BpfError> {
        let source = BpfEventSource::new(object)?;
        for warning in source.warnings() {
            logger.warn(warning);
        }
        Ok(source)
    };

    fence_monitor::execute_watch(args, open, &RealFilesystem, &SystemClock, cancel, logger)
}

/// Without the `bpf` feature there is nothing to attach to.
#[cfg(not(feature = "bpf"))]
fn run_watch(
    args: &WatchArgs,
    cancel: &CancelToken,
    logger: &StderrLogger,
) -> Result<SessionSummary, CommandError> {
    let open = || Err::<fence_bpf::ReplaySource, _>(fence_bpf::BpfError::Unsupported);
    fence_monitor::execute_watch(args, open, &RealFilesystem, &SystemClock, cancel, logger)
}

/// Run the replay command.
fn run_replay(
    args: &ReplayArgs,
    cancel: &CancelToken,
    logger: &StderrLogger,
) -> Result<SessionSummary, CommandError> {
    execute_replay(args, &RealFilesystem, &SystemClock, cancel, logger)
}
