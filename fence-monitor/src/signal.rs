//! Signal handling for graceful shutdown.
//!
//! SIGINT and SIGTERM cancel the shared [`CancelToken`], which wakes the
//! control loop out of any blocking read.

use fence_bpf::CancelToken;

/// Register a SIGINT/SIGTERM handler that cancels `cancel`.
///
/// Only one handler can exist per process; a second call fails with
/// [`ctrlc::Error::MultipleHandlers`].
pub fn install_handler(cancel: &CancelToken) -> Result<(), ctrlc::Error> {
    let cancel = cancel.clone();
    ctrlc::set_handler(move || cancel.cancel())
}
