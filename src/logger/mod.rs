//! Activity journal for workflow milestones.

pub mod journal;

pub use journal::{ActivityJournal, EventType, JournalEntry};
