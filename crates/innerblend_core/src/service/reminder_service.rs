//! Reminder use-case service.
//!
//! Reminders are owner-scoped records; nothing here schedules them.

use crate::access::{ensure_owner, Actor};
use crate::model::now_epoch_ms;
use crate::model::reminder::{Reminder, ReminderId};
use crate::model::ResourceKind;
use crate::repo::reminder_repo::ReminderRepository;
use crate::service::error::{require_text, ServiceError, ServiceResult};
use chrono::{NaiveTime, Timelike};
use log::info;
use serde::Deserialize;

const MESSAGE_REQUIRED: &str = "reminder message is required";
const TIME_REQUIRED: &str = "reminder time is required";

/// Input for reminder creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateReminderRequest {
    pub message: Option<String>,
    pub remind_at: Option<NaiveTime>,
    /// Defaults to active.
    pub is_active: Option<bool>,
}

/// Partial reminder update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateReminderRequest {
    pub message: Option<String>,
    pub remind_at: Option<NaiveTime>,
    pub is_active: Option<bool>,
}

pub struct ReminderService<R: ReminderRepository> {
    repo: R,
}

impl<R: ReminderRepository> ReminderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_reminder(
        &self,
        actor: &Actor,
        request: CreateReminderRequest,
    ) -> ServiceResult<Reminder> {
        let owner_id = actor.require_user_id()?;
        let message = require_text(
            request.message.as_deref().unwrap_or_default(),
            MESSAGE_REQUIRED,
        )?;
        let remind_at = request
            .remind_at
            .map(whole_seconds)
            .ok_or_else(|| ServiceError::validation(TIME_REQUIRED))?;

        let reminder = Reminder::new(
            owner_id,
            message,
            remind_at,
            request.is_active.unwrap_or(true),
        );
        self.repo.create_reminder(&reminder)?;
        info!(
            "event=reminder_create module=service status=ok reminder_id={}",
            reminder.uuid
        );
        Ok(reminder)
    }

    /// Lists the actor's reminders ordered by time of day.
    pub fn list_reminders(&self, actor: &Actor) -> ServiceResult<Vec<Reminder>> {
        let owner_id = actor.require_user_id()?;
        Ok(self.repo.list_reminders(owner_id)?)
    }

    pub fn get_reminder(&self, actor: &Actor, reminder_id: ReminderId) -> ServiceResult<Reminder> {
        self.load_owned(actor, reminder_id)
    }

    pub fn update_reminder(
        &self,
        actor: &Actor,
        reminder_id: ReminderId,
        request: UpdateReminderRequest,
    ) -> ServiceResult<Reminder> {
        let mut reminder = self.load_owned(actor, reminder_id)?;

        if let Some(message) = request.message {
            reminder.message = require_text(&message, MESSAGE_REQUIRED)?;
        }
        if let Some(remind_at) = request.remind_at {
            reminder.remind_at = whole_seconds(remind_at);
        }
        if let Some(is_active) = request.is_active {
            reminder.is_active = is_active;
        }
        reminder.updated_at = now_epoch_ms().max(reminder.updated_at);

        self.repo.update_reminder(&reminder)?;
        info!(
            "event=reminder_update module=service status=ok reminder_id={}",
            reminder_id
        );
        Ok(reminder)
    }

    pub fn delete_reminder(&self, actor: &Actor, reminder_id: ReminderId) -> ServiceResult<()> {
        self.load_owned(actor, reminder_id)?;
        self.repo.delete_reminder(reminder_id)?;
        info!(
            "event=reminder_delete module=service status=ok reminder_id={}",
            reminder_id
        );
        Ok(())
    }

    fn load_owned(&self, actor: &Actor, reminder_id: ReminderId) -> ServiceResult<Reminder> {
        actor.require_user_id()?;
        let reminder = self.repo.get_reminder(reminder_id)?;
        ensure_owner(
            actor,
            reminder.as_ref().map(|reminder| reminder.owner_id.as_str()),
            ResourceKind::Reminder,
            reminder_id,
        )?;
        reminder.ok_or_else(|| ServiceError::not_found(ResourceKind::Reminder, reminder_id))
    }
}

/// Stored times carry second precision.
fn whole_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}
