//! Reminder repository contracts and SQLite implementation.

use crate::model::reminder::{Reminder, ReminderId};
use crate::model::ResourceKind;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::support::{bool_to_int, ensure_connection_ready, int_to_bool, parse_uuid};
use chrono::NaiveTime;
use rusqlite::{params, Connection, Row};

const REMINDER_SELECT_SQL: &str = "SELECT
    uuid,
    user_id,
    message,
    remind_at,
    is_active,
    created_at,
    updated_at
FROM reminders";

const TIME_FORMAT: &str = "%H:%M:%S";

/// Repository interface for reminders.
pub trait ReminderRepository {
    fn create_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId>;
    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>>;
    /// Owner's reminders ordered by time of day.
    fn list_reminders(&self, owner_id: &str) -> RepoResult<Vec<Reminder>>;
    fn update_reminder(&self, reminder: &Reminder) -> RepoResult<()>;
    fn delete_reminder(&self, id: ReminderId) -> RepoResult<()>;
}

/// SQLite-backed reminder repository.
pub struct SqliteReminderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReminderRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ReminderRepository for SqliteReminderRepository<'_> {
    fn create_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId> {
        self.conn.execute(
            "INSERT INTO reminders (
                uuid,
                user_id,
                message,
                remind_at,
                is_active,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                reminder.uuid.to_string(),
                reminder.owner_id.as_str(),
                reminder.message.as_str(),
                reminder.remind_at.format(TIME_FORMAT).to_string(),
                bool_to_int(reminder.is_active),
                reminder.created_at,
                reminder.updated_at,
            ],
        )?;
        Ok(reminder.uuid)
    }

    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REMINDER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reminder_row(row)?));
        }
        Ok(None)
    }

    fn list_reminders(&self, owner_id: &str) -> RepoResult<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REMINDER_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY remind_at ASC, created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([owner_id])?;
        let mut reminders = Vec::new();
        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }
        Ok(reminders)
    }

    fn update_reminder(&self, reminder: &Reminder) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE reminders
             SET
                message = ?2,
                remind_at = ?3,
                is_active = ?4,
                updated_at = ?5
             WHERE uuid = ?1;",
            params![
                reminder.uuid.to_string(),
                reminder.message.as_str(),
                reminder.remind_at.format(TIME_FORMAT).to_string(),
                bool_to_int(reminder.is_active),
                reminder.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                resource: ResourceKind::Reminder,
                id: reminder.uuid.to_string(),
            });
        }
        Ok(())
    }

    fn delete_reminder(&self, id: ReminderId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reminders WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                resource: ResourceKind::Reminder,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_reminder_row(row: &Row<'_>) -> RepoResult<Reminder> {
    let uuid_text: String = row.get("uuid")?;
    let time_text: String = row.get("remind_at")?;
    let remind_at = NaiveTime::parse_from_str(&time_text, TIME_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid time value `{time_text}` in reminders.remind_at"
        ))
    })?;

    Ok(Reminder {
        uuid: parse_uuid(&uuid_text, "reminders.uuid")?,
        owner_id: row.get("user_id")?,
        message: row.get("message")?,
        remind_at,
        is_active: int_to_bool(row.get("is_active")?, "reminders.is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
