//! Notices emitted by the decision engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ActorId;

/// An observable step of the escalation toward a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A disallowed path was opened by an in-scope process.
    Violation {
        pid: ActorId,
        comm: String,
        path: String,
        count: u32,
        threshold: u32,
    },
    /// The block command was issued for the process.
    Blocked {
        pid: ActorId,
        comm: String,
        count: u32,
    },
}

impl Notice {
    /// Process the notice is about.
    pub fn pid(&self) -> ActorId {
        match self {
            Notice::Violation { pid, .. } | Notice::Blocked { pid, .. } => *pid,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Violation {
                pid,
                comm,
                path,
                count,
                threshold,
            } => write!(
                f,
                "[VIOLATION {}/{}] PID {} ({}) opened disallowed file: {}",
                count, threshold, pid, comm, path
            ),
            Notice::Blocked { pid, .. } => write!(
                f,
                "*** PID {} is now BLOCKED from opening any further files! ***",
                pid
            ),
        }
    }
}
