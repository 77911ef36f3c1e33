//! File input and output for the CLI commands.

pub mod event_loader;
pub mod journal;
pub mod pattern_loader;

pub use event_loader::{load_events, parse_events, ReplayLoadError};
pub use journal::{JournalEntry, JournalError, JournalWriter};
pub use pattern_loader::{load_patterns, parse_patterns, PatternLoadError};
