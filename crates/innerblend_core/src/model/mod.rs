//! Journal domain model.
//!
//! # Responsibility
//! - Define the records shared by repositories and services.
//! - Keep text-to-enum parsing (mood, tag names) at the model edge.
//!
//! # Invariants
//! - Journals, tags and reminders carry their owner directly; entries are
//!   owned through their parent journal.
//! - Timestamps are UTC epoch milliseconds.

use std::fmt::{Display, Formatter};

pub mod entry;
pub mod image;
pub mod journal;
pub mod reminder;
pub mod tag;
pub mod user;

/// Kind of resource named in not-found and ownership failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Journal,
    Entry,
    Image,
    Reminder,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Journal => "journal",
            Self::Entry => "journal entry",
            Self::Image => "image",
            Self::Reminder => "reminder",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current UTC time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
