//! fence decision engine
//!
//! Consumes open events from an [`fence_bpf::EventSource`], classifies each
//! path against the disallowed patterns, keeps a per-process violation
//! ledger, and issues the block command exactly once per process when its
//! count reaches the threshold.

pub mod config;
pub mod control;
pub mod engine;
pub mod ledger;
pub mod logger;
pub mod matcher;
pub mod sink;

pub use config::{ConfigError, EngineConfig, TargetFilter};
pub use control::{ControlLoop, RunStats};
pub use engine::{DecisionEngine, EngineError, IgnoreReason, Outcome};
pub use ledger::ViolationLedger;
pub use logger::{LogEntry, Logger, MockLogger, NullLogger, StderrLogger, Verbosity};
pub use matcher::{matches, Policy};
pub use sink::{LogSink, NoticeSink, NullSink, RecordingSink, Tee};
