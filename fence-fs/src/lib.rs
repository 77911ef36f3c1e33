//! Filesystem abstraction for fence.
//!
//! The monitor reads pattern and replay files and appends notice journals;
//! all of it goes through [`Filesystem`] so commands can be tested against
//! [`MockFilesystem`].

mod filesystem;

pub use filesystem::{Filesystem, FsError, MockFilesystem, RealFilesystem};
