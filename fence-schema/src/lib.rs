//! fence event schema
//!
//! Defines the decoded file-open event delivered by the capture program and
//! the notices the decision engine emits while escalating toward a block.

mod event;
mod notice;

pub use event::{trim_nul, ActorId, Event, COMM_LEN, PATH_LEN};
pub use notice::Notice;
