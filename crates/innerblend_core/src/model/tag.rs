//! Tag model and name normalization.
//!
//! # Invariants
//! - Persisted tag names are trimmed and lower-cased.
//! - A user never owns two tags with the same normalized name.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable tag identifier.
pub type TagId = Uuid;

/// User-scoped label shared by any number of that user's entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub uuid: TagId,
    pub owner_id: UserId,
    pub name: String,
}

impl Tag {
    /// Creates a tag for an already-normalized name.
    pub fn new(owner_id: impl Into<UserId>, normalized_name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            owner_id: owner_id.into(),
            name: normalized_name.into(),
        }
    }
}

/// Normalizes one tag name. Returns `None` for blank input.
pub fn normalize_tag_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes, drops blanks and deduplicates tag names, sorted by name.
pub fn normalize_tag_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names
        .iter()
        .filter_map(|name| normalize_tag_name(name.as_ref()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
