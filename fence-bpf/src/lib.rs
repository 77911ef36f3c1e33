//! fence capture/enforcement support
//!
//! This crate provides:
//! - `CancelToken`, the cooperative cancellation signal threaded through
//!   every blocking read
//! - the `EventSource` contract the decision engine consumes
//! - `ReplaySource`, a deterministic in-memory source for tests and dry runs
//! - raw ring-buffer record decoding
//! - `BpfEventSource` (feature `bpf`), which loads the LSM/tracepoint program

pub mod cancel;
pub mod record;
pub mod replay;
pub mod source;

#[cfg(feature = "bpf")]
pub mod bpf_source;

pub use cancel::CancelToken;
pub use record::{decode_record, RecordError, RECORD_SIZE};
pub use replay::ReplaySource;
pub use source::{BpfError, EventSource, SourceError};

#[cfg(feature = "bpf")]
pub use bpf_source::BpfEventSource;
