//! Journal entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist entries together with their reconciled tag links.
//! - Resolve entry ownership through the parent journal.
//!
//! # Invariants
//! - Entry row writes and tag reconciliation share one `IMMEDIATE`
//!   transaction; a failure leaves neither the entry nor new tags behind.
//! - Deleting an entry removes its tag links explicitly and never deletes tag
//!   rows.
//! - Entry listing is sorted by `created_at DESC, uuid ASC`.

use crate::model::entry::{EntryId, JournalEntry, Mood};
use crate::model::journal::JournalId;
use crate::model::tag::Tag;
use crate::model::user::UserId;
use crate::model::ResourceKind;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::image_repo::load_image_urls_for_entry;
use crate::repo::journal_repo::load_journal_owner;
use crate::repo::support::{begin_write, ensure_connection_ready, parse_uuid};
use crate::repo::tag_repo::{
    list_owner_tags, load_tag_names_for_entry, reconcile_entry_tags, LinkMode, TagReconciliation,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

const ENTRY_SELECT_SQL: &str = "SELECT
    uuid,
    journal_uuid,
    title,
    content,
    mood,
    location,
    created_at,
    updated_at
FROM journal_entries";

/// Read model for entry detail/list use-cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRecord {
    pub entry_id: EntryId,
    pub journal_id: JournalId,
    pub title: String,
    pub content: String,
    pub mood: Option<Mood>,
    pub location: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Normalized tag names, sorted.
    pub tags: Vec<String>,
    /// Image URLs in upload order.
    pub image_urls: Vec<String>,
}

/// Owner chain of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOwnership {
    pub journal_id: JournalId,
    pub owner_id: UserId,
}

/// Outcome of deleting one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryDeletion {
    pub removed_tag_links: usize,
    /// Image URLs whose rows were removed; blobs still exist in storage.
    pub orphaned_image_urls: Vec<String>,
}

/// Repository interface for journal entries.
pub trait EntryRepository {
    /// Owner of `journal_id`, or `None` when the journal does not exist.
    fn journal_owner(&self, journal_id: JournalId) -> RepoResult<Option<UserId>>;
    /// Parent journal and owner of `entry_id`, or `None` when missing.
    fn entry_ownership(&self, entry_id: EntryId) -> RepoResult<Option<EntryOwnership>>;
    fn get_entry(&self, entry_id: EntryId) -> RepoResult<Option<JournalEntry>>;
    fn get_entry_record(&self, entry_id: EntryId) -> RepoResult<Option<EntryRecord>>;
    fn list_entry_records(&self, journal_id: JournalId) -> RepoResult<Vec<EntryRecord>>;
    /// Inserts `entry` and links the reconciled `tag_names` in one transaction.
    fn create_entry(
        &self,
        owner_id: &str,
        entry: &JournalEntry,
        tag_names: &[String],
    ) -> RepoResult<TagReconciliation>;
    /// Writes entry fields and fully replaces the tag links with
    /// `tag_names`, in one transaction.
    fn update_entry(
        &self,
        owner_id: &str,
        entry: &JournalEntry,
        tag_names: &[String],
    ) -> RepoResult<TagReconciliation>;
    /// Changes only the parent journal and `updated_at`.
    fn move_entry(
        &self,
        entry_id: EntryId,
        journal_id: JournalId,
        updated_at: i64,
    ) -> RepoResult<()>;
    fn delete_entry(&self, entry_id: EntryId) -> RepoResult<EntryDeletion>;
    /// Every tag owned by `owner_id`, sorted by name.
    fn list_tags(&self, owner_id: &str) -> RepoResult<Vec<Tag>>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn journal_owner(&self, journal_id: JournalId) -> RepoResult<Option<UserId>> {
        load_journal_owner(self.conn, journal_id)
    }

    fn entry_ownership(&self, entry_id: EntryId) -> RepoResult<Option<EntryOwnership>> {
        load_entry_ownership(self.conn, entry_id)
    }

    fn get_entry(&self, entry_id: EntryId) -> RepoResult<Option<JournalEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([entry_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }
        Ok(None)
    }

    fn get_entry_record(&self, entry_id: EntryId) -> RepoResult<Option<EntryRecord>> {
        match self.get_entry(entry_id)? {
            Some(entry) => Ok(Some(build_record(self.conn, entry)?)),
            None => Ok(None),
        }
    }

    fn list_entry_records(&self, journal_id: JournalId) -> RepoResult<Vec<EntryRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             WHERE journal_uuid = ?1
             ORDER BY created_at DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([journal_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        entries
            .into_iter()
            .map(|entry| build_record(self.conn, entry))
            .collect()
    }

    fn create_entry(
        &self,
        owner_id: &str,
        entry: &JournalEntry,
        tag_names: &[String],
    ) -> RepoResult<TagReconciliation> {
        let tx = begin_write(self.conn)?;
        tx.execute(
            "INSERT INTO journal_entries (
                uuid,
                journal_uuid,
                title,
                content,
                mood,
                location,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                entry.uuid.to_string(),
                entry.journal_id.to_string(),
                entry.title.as_str(),
                entry.content.as_str(),
                entry.mood.map(Mood::as_str),
                entry.location.as_deref(),
                entry.created_at,
                entry.updated_at,
            ],
        )?;
        let reconciliation =
            reconcile_entry_tags(&tx, owner_id, entry.uuid, tag_names, LinkMode::Create)?;
        tx.commit()?;
        Ok(reconciliation)
    }

    fn update_entry(
        &self,
        owner_id: &str,
        entry: &JournalEntry,
        tag_names: &[String],
    ) -> RepoResult<TagReconciliation> {
        let tx = begin_write(self.conn)?;
        let changed = tx.execute(
            "UPDATE journal_entries
             SET
                title = ?2,
                content = ?3,
                mood = ?4,
                location = ?5,
                updated_at = ?6
             WHERE uuid = ?1;",
            params![
                entry.uuid.to_string(),
                entry.title.as_str(),
                entry.content.as_str(),
                entry.mood.map(Mood::as_str),
                entry.location.as_deref(),
                entry.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                resource: ResourceKind::Entry,
                id: entry.uuid.to_string(),
            });
        }

        let reconciliation =
            reconcile_entry_tags(&tx, owner_id, entry.uuid, tag_names, LinkMode::Replace)?;
        tx.commit()?;
        Ok(reconciliation)
    }

    fn move_entry(
        &self,
        entry_id: EntryId,
        journal_id: JournalId,
        updated_at: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE journal_entries
             SET
                journal_uuid = ?2,
                updated_at = ?3
             WHERE uuid = ?1;",
            params![entry_id.to_string(), journal_id.to_string(), updated_at],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                resource: ResourceKind::Entry,
                id: entry_id.to_string(),
            });
        }
        Ok(())
    }

    fn delete_entry(&self, entry_id: EntryId) -> RepoResult<EntryDeletion> {
        let id_text = entry_id.to_string();
        let tx = begin_write(self.conn)?;

        let orphaned_image_urls = load_image_urls_for_entry(&tx, &id_text)?;
        let removed_tag_links = tx.execute(
            "DELETE FROM journal_entry_tags WHERE entry_uuid = ?1;",
            [id_text.as_str()],
        )?;
        let changed = tx.execute(
            "DELETE FROM journal_entries WHERE uuid = ?1;",
            [id_text.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                resource: ResourceKind::Entry,
                id: id_text,
            });
        }

        tx.commit()?;
        Ok(EntryDeletion {
            removed_tag_links,
            orphaned_image_urls,
        })
    }

    fn list_tags(&self, owner_id: &str) -> RepoResult<Vec<Tag>> {
        list_owner_tags(self.conn, owner_id)
    }
}

/// Resolves the journal and owner of one entry.
pub(crate) fn load_entry_ownership(
    conn: &Connection,
    entry_id: EntryId,
) -> RepoResult<Option<EntryOwnership>> {
    let row = conn
        .query_row(
            "SELECT j.uuid, j.user_id
             FROM journal_entries e
             INNER JOIN journals j ON j.uuid = e.journal_uuid
             WHERE e.uuid = ?1;",
            [entry_id.to_string()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    match row {
        Some((journal_text, owner_id)) => Ok(Some(EntryOwnership {
            journal_id: parse_uuid(&journal_text, "journals.uuid")?,
            owner_id,
        })),
        None => Ok(None),
    }
}

fn build_record(conn: &Connection, entry: JournalEntry) -> RepoResult<EntryRecord> {
    let id_text = entry.uuid.to_string();
    let tags = load_tag_names_for_entry(conn, &id_text)?;
    let image_urls = load_image_urls_for_entry(conn, &id_text)?;
    Ok(EntryRecord {
        entry_id: entry.uuid,
        journal_id: entry.journal_id,
        title: entry.title,
        content: entry.content,
        mood: entry.mood,
        location: entry.location,
        created_at: entry.created_at,
        updated_at: entry.updated_at,
        tags,
        image_urls,
    })
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<JournalEntry> {
    let uuid_text: String = row.get("uuid")?;
    let journal_text: String = row.get("journal_uuid")?;

    let mood = match row.get::<_, Option<String>>("mood")? {
        Some(value) => Some(Mood::from_db(&value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid mood `{value}` in journal_entries.mood"))
        })?),
        None => None,
    };

    Ok(JournalEntry {
        uuid: parse_uuid(&uuid_text, "journal_entries.uuid")?,
        journal_id: parse_uuid(&journal_text, "journal_entries.journal_uuid")?,
        title: row.get("title")?,
        content: row.get("content")?,
        mood,
        location: row.get("location")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
