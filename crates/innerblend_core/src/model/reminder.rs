//! Reminder model.
//!
//! Reminders are stored data only; nothing in the core schedules or fires them.

use crate::model::now_epoch_ms;
use crate::model::user::UserId;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable reminder identifier.
pub type ReminderId = Uuid;

/// Daily reminder owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub uuid: ReminderId,
    pub owner_id: UserId,
    pub message: String,
    /// Time of day, second precision.
    pub remind_at: NaiveTime,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Reminder {
    pub fn new(
        owner_id: impl Into<UserId>,
        message: impl Into<String>,
        remind_at: NaiveTime,
        is_active: bool,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            uuid: Uuid::new_v4(),
            owner_id: owner_id.into(),
            message: message.into(),
            remind_at,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }
}
