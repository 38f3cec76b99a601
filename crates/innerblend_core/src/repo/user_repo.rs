//! User profile repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Usernames and emails are unique case-insensitively (`COLLATE NOCASE`).
//!   A write that loses a race on either column reports `RepoError::Conflict`.
//! - Deleting a user cascades to journals, entries, tags and reminders.

use crate::model::user::UserProfile;
use crate::model::ResourceKind;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::support::{begin_write, ensure_connection_ready};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    first_name,
    last_name,
    phone_number,
    created_at,
    updated_at
FROM users";

/// Unique profile field already taken by another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserConflict {
    Username,
    Email,
}

/// Repository interface for user profiles.
pub trait UserRepository {
    fn create_user(&self, user: &UserProfile) -> RepoResult<()>;
    fn get_user(&self, id: &str) -> RepoResult<Option<UserProfile>>;
    /// Reports which of `username`/`email` are taken by users other than
    /// `exclude_id`.
    fn find_conflicts(
        &self,
        username: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> RepoResult<Vec<UserConflict>>;
    fn update_user(&self, user: &UserProfile) -> RepoResult<()>;
    /// Deletes the user and everything they own; returns the image URLs whose
    /// rows were removed by the cascade.
    fn delete_user(&self, id: &str) -> RepoResult<Vec<String>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &UserProfile) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO users (
                id,
                username,
                email,
                first_name,
                last_name,
                phone_number,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                user.id.as_str(),
                user.username.as_str(),
                user.email.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.phone_number.as_deref(),
                user.created_at,
                user.updated_at,
            ],
        )
        .map_err(map_unique_violation)?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> RepoResult<Option<UserProfile>> {
        load_user(self.conn, id)
    }

    fn find_conflicts(
        &self,
        username: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> RepoResult<Vec<UserConflict>> {
        let (username_taken, email_taken): (i64, i64) = self.conn.query_row(
            "SELECT
                EXISTS(SELECT 1 FROM users WHERE username = ?1 AND (?3 IS NULL OR id <> ?3)),
                EXISTS(SELECT 1 FROM users WHERE email = ?2 AND (?3 IS NULL OR id <> ?3));",
            params![username, email, exclude_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let mut conflicts = Vec::new();
        if email_taken == 1 {
            conflicts.push(UserConflict::Email);
        }
        if username_taken == 1 {
            conflicts.push(UserConflict::Username);
        }
        Ok(conflicts)
    }

    fn update_user(&self, user: &UserProfile) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                username = ?2,
                email = ?3,
                first_name = ?4,
                last_name = ?5,
                phone_number = ?6,
                updated_at = ?7
             WHERE id = ?1;",
            params![
                user.id.as_str(),
                user.username.as_str(),
                user.email.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.phone_number.as_deref(),
                user.updated_at,
            ],
        )
        .map_err(map_unique_violation)?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                resource: ResourceKind::User,
                id: user.id.clone(),
            });
        }
        Ok(())
    }

    fn delete_user(&self, id: &str) -> RepoResult<Vec<String>> {
        let tx = begin_write(self.conn)?;
        let image_urls = {
            let mut stmt = tx.prepare(
                "SELECT i.image_url
                 FROM journal_entry_images i
                 INNER JOIN journal_entries e ON e.uuid = i.entry_uuid
                 INNER JOIN journals j ON j.uuid = e.journal_uuid
                 WHERE j.user_id = ?1
                 ORDER BY i.uploaded_at ASC, i.rowid ASC;",
            )?;
            let urls = stmt
                .query_map([id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            urls
        };

        let changed = tx.execute("DELETE FROM users WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                resource: ResourceKind::User,
                id: id.to_string(),
            });
        }

        tx.commit()?;
        Ok(image_urls)
    }
}

/// Loads one profile; shared with repositories that resolve owners.
pub(crate) fn load_user(conn: &Connection, id: &str) -> RepoResult<Option<UserProfile>> {
    let user = conn
        .query_row(
            &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
            [id],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

fn map_unique_violation(err: rusqlite::Error) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            if message.contains("users.email") {
                return RepoError::Conflict { field: "email" };
            }
            if message.contains("users.username") {
                return RepoError::Conflict { field: "username" };
            }
        }
    }
    err.into()
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        phone_number: row.get("phone_number")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
