//! Journal entry model and mood enumeration.
//!
//! # Invariants
//! - `Mood` is a closed set; free text only reaches it through
//!   `Mood::parse_lenient`.
//! - An entry belongs to exactly one journal; ownership is resolved through it.

use crate::model::journal::JournalId;
use crate::model::now_epoch_ms;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable journal entry identifier.
pub type EntryId = Uuid;

/// Mood recorded with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    VerySad,
    Sad,
    Neutral,
    Happy,
    VeryHappy,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::VerySad,
        Mood::Sad,
        Mood::Neutral,
        Mood::Happy,
        Mood::VeryHappy,
    ];

    /// Storage/wire value (`snake_case`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VerySad => "very_sad",
            Self::Sad => "sad",
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::VeryHappy => "very_happy",
        }
    }

    /// Parses user-typed mood text.
    ///
    /// Whitespace anywhere in the value is ignored and matching is
    /// case-insensitive, so `"very happy"`, `"VeryHappy"` and `" VERYHAPPY "`
    /// all map to `VeryHappy`. Anything else yields `None`; callers treat that
    /// as "no mood supplied" rather than an error.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        let compact = WHITESPACE_RE.replace_all(value, "");
        Self::ALL.into_iter().find(|mood| {
            mood.as_str()
                .replace('_', "")
                .eq_ignore_ascii_case(compact.as_ref())
        })
    }

    pub(crate) fn from_db(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mood| mood.as_str() == value)
    }
}

impl Display for Mood {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One journal writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub uuid: EntryId,
    pub journal_id: JournalId,
    pub title: String,
    pub content: String,
    pub mood: Option<Mood>,
    pub location: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl JournalEntry {
    /// Creates an entry with a generated id and `created_at == updated_at`.
    pub fn new(
        journal_id: JournalId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            uuid: Uuid::new_v4(),
            journal_id,
            title: title.into(),
            content: content.into(),
            mood: None,
            location: None,
            created_at: now,
            updated_at: now,
        }
    }
}
