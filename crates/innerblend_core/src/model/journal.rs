//! Journal model.

use crate::model::now_epoch_ms;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable journal identifier.
pub type JournalId = Uuid;

/// Named collection of entries owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
    pub uuid: JournalId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Journal {
    /// Creates a journal with a generated id and `created_at == updated_at`.
    pub fn new(
        owner_id: impl Into<UserId>,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            uuid: Uuid::new_v4(),
            owner_id: owner_id.into(),
            title: title.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }
}
