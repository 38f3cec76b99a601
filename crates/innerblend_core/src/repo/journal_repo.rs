//! Journal repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Journal listing is scoped to one owner, newest `updated_at` first.
//! - Deleting a journal cascades to entries, tag links and image rows; tag
//!   rows are never removed here.

use crate::model::journal::{Journal, JournalId};
use crate::model::user::UserProfile;
use crate::model::ResourceKind;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::support::{begin_write, ensure_connection_ready, parse_uuid};
use crate::repo::user_repo::load_user;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

const JOURNAL_SELECT_SQL: &str = "SELECT
    uuid,
    user_id,
    title,
    description,
    created_at,
    updated_at
FROM journals";

/// Journal plus the number of entries it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalSummary {
    pub journal: Journal,
    pub entry_count: u32,
}

/// Outcome of a cascading journal delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JournalDeletion {
    /// Entries removed by the cascade.
    pub deleted_entries: u32,
    /// Image URLs whose rows were removed; blobs still exist in storage.
    pub orphaned_image_urls: Vec<String>,
}

/// Repository interface for journals.
pub trait JournalRepository {
    fn create_journal(&self, journal: &Journal) -> RepoResult<JournalId>;
    fn get_journal(&self, id: JournalId) -> RepoResult<Option<Journal>>;
    fn list_journals(&self, owner_id: &str) -> RepoResult<Vec<JournalSummary>>;
    /// Writes title, description and `updated_at`.
    fn update_journal(&self, journal: &Journal) -> RepoResult<()>;
    fn delete_journal(&self, id: JournalId) -> RepoResult<JournalDeletion>;
    /// Resolves the owner's profile for journal read models.
    fn owner_profile(&self, owner_id: &str) -> RepoResult<Option<UserProfile>>;
}

/// SQLite-backed journal repository.
pub struct SqliteJournalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJournalRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl JournalRepository for SqliteJournalRepository<'_> {
    fn create_journal(&self, journal: &Journal) -> RepoResult<JournalId> {
        self.conn.execute(
            "INSERT INTO journals (
                uuid,
                user_id,
                title,
                description,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                journal.uuid.to_string(),
                journal.owner_id.as_str(),
                journal.title.as_str(),
                journal.description.as_deref(),
                journal.created_at,
                journal.updated_at,
            ],
        )?;
        Ok(journal.uuid)
    }

    fn get_journal(&self, id: JournalId) -> RepoResult<Option<Journal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{JOURNAL_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_journal_row(row)?));
        }
        Ok(None)
    }

    fn list_journals(&self, owner_id: &str) -> RepoResult<Vec<JournalSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                j.uuid,
                j.user_id,
                j.title,
                j.description,
                j.created_at,
                j.updated_at,
                (SELECT COUNT(*) FROM journal_entries e WHERE e.journal_uuid = j.uuid)
                    AS entry_count
             FROM journals j
             WHERE j.user_id = ?1
             ORDER BY j.updated_at DESC, j.uuid ASC;",
        )?;
        let mut rows = stmt.query([owner_id])?;
        let mut journals = Vec::new();
        while let Some(row) = rows.next()? {
            journals.push(JournalSummary {
                journal: parse_journal_row(row)?,
                entry_count: row.get("entry_count")?,
            });
        }
        Ok(journals)
    }

    fn update_journal(&self, journal: &Journal) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE journals
             SET
                title = ?2,
                description = ?3,
                updated_at = ?4
             WHERE uuid = ?1;",
            params![
                journal.uuid.to_string(),
                journal.title.as_str(),
                journal.description.as_deref(),
                journal.updated_at,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                resource: ResourceKind::Journal,
                id: journal.uuid.to_string(),
            });
        }
        Ok(())
    }

    fn delete_journal(&self, id: JournalId) -> RepoResult<JournalDeletion> {
        let id_text = id.to_string();
        let tx = begin_write(self.conn)?;

        let deleted_entries: u32 = tx.query_row(
            "SELECT COUNT(*) FROM journal_entries WHERE journal_uuid = ?1;",
            [id_text.as_str()],
            |row| row.get(0),
        )?;
        let orphaned_image_urls = {
            let mut stmt = tx.prepare(
                "SELECT i.image_url
                 FROM journal_entry_images i
                 INNER JOIN journal_entries e ON e.uuid = i.entry_uuid
                 WHERE e.journal_uuid = ?1
                 ORDER BY i.uploaded_at ASC, i.rowid ASC;",
            )?;
            let urls = stmt
                .query_map([id_text.as_str()], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            urls
        };

        let changed = tx.execute("DELETE FROM journals WHERE uuid = ?1;", [id_text.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                resource: ResourceKind::Journal,
                id: id_text,
            });
        }

        tx.commit()?;
        Ok(JournalDeletion {
            deleted_entries,
            orphaned_image_urls,
        })
    }

    fn owner_profile(&self, owner_id: &str) -> RepoResult<Option<UserProfile>> {
        load_user(self.conn, owner_id)
    }
}

/// Loads the owner of one journal; `None` when the journal does not exist.
pub(crate) fn load_journal_owner(conn: &Connection, id: JournalId) -> RepoResult<Option<String>> {
    let owner = conn
        .query_row(
            "SELECT user_id FROM journals WHERE uuid = ?1;",
            [id.to_string()],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(owner)
}

fn parse_journal_row(row: &Row<'_>) -> RepoResult<Journal> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Journal {
        uuid: parse_uuid(&uuid_text, "journals.uuid")?,
        owner_id: row.get("user_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
