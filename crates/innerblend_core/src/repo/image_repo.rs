//! Entry image repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Image URLs are unique per entry, so `(entry, url)` identifies one image.
//! - Batch inserts and deletes are atomic.

use crate::model::entry::EntryId;
use crate::model::image::{EntryImage, ImageId};
use crate::model::user::UserId;
use crate::model::ResourceKind;
use crate::repo::entry_repo::load_entry_ownership;
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::support::{begin_write, ensure_connection_ready, parse_uuid};
use rusqlite::{params, Connection, Row};

const IMAGE_SELECT_SQL: &str = "SELECT
    uuid,
    entry_uuid,
    image_url,
    uploaded_at
FROM journal_entry_images";

/// Repository interface for entry images.
pub trait ImageRepository {
    /// Owner of the entry's journal, or `None` when the entry does not exist.
    fn entry_owner(&self, entry_id: EntryId) -> RepoResult<Option<UserId>>;
    fn list_images(&self, entry_id: EntryId) -> RepoResult<Vec<EntryImage>>;
    fn find_image(&self, entry_id: EntryId, image_url: &str) -> RepoResult<Option<EntryImage>>;
    fn insert_images(&self, images: &[EntryImage]) -> RepoResult<()>;
    /// Points an existing image row at a new URL.
    fn replace_image_url(
        &self,
        image_id: ImageId,
        image_url: &str,
        uploaded_at: i64,
    ) -> RepoResult<()>;
    /// Deletes the listed images of one entry; returns how many rows went away.
    fn delete_images(&self, entry_id: EntryId, image_urls: &[String]) -> RepoResult<usize>;
}

/// SQLite-backed image repository.
pub struct SqliteImageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteImageRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ImageRepository for SqliteImageRepository<'_> {
    fn entry_owner(&self, entry_id: EntryId) -> RepoResult<Option<UserId>> {
        Ok(load_entry_ownership(self.conn, entry_id)?.map(|ownership| ownership.owner_id))
    }

    fn list_images(&self, entry_id: EntryId) -> RepoResult<Vec<EntryImage>> {
        let mut stmt = self.conn.prepare(&format!(
            "{IMAGE_SELECT_SQL}
             WHERE entry_uuid = ?1
             ORDER BY uploaded_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([entry_id.to_string()])?;
        let mut images = Vec::new();
        while let Some(row) = rows.next()? {
            images.push(parse_image_row(row)?);
        }
        Ok(images)
    }

    fn find_image(&self, entry_id: EntryId, image_url: &str) -> RepoResult<Option<EntryImage>> {
        let mut stmt = self.conn.prepare(&format!(
            "{IMAGE_SELECT_SQL} WHERE entry_uuid = ?1 AND image_url = ?2;"
        ))?;
        let mut rows = stmt.query(params![entry_id.to_string(), image_url])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_image_row(row)?));
        }
        Ok(None)
    }

    fn insert_images(&self, images: &[EntryImage]) -> RepoResult<()> {
        let tx = begin_write(self.conn)?;
        for image in images {
            tx.execute(
                "INSERT INTO journal_entry_images (uuid, entry_uuid, image_url, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    image.uuid.to_string(),
                    image.entry_id.to_string(),
                    image.image_url.as_str(),
                    image.uploaded_at,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn replace_image_url(
        &self,
        image_id: ImageId,
        image_url: &str,
        uploaded_at: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE journal_entry_images
             SET
                image_url = ?2,
                uploaded_at = ?3
             WHERE uuid = ?1;",
            params![image_id.to_string(), image_url, uploaded_at],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                resource: ResourceKind::Image,
                id: image_id.to_string(),
            });
        }
        Ok(())
    }

    fn delete_images(&self, entry_id: EntryId, image_urls: &[String]) -> RepoResult<usize> {
        let entry_text = entry_id.to_string();
        let tx = begin_write(self.conn)?;
        let mut removed = 0;
        for url in image_urls {
            removed += tx.execute(
                "DELETE FROM journal_entry_images WHERE entry_uuid = ?1 AND image_url = ?2;",
                params![entry_text.as_str(), url.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(removed)
    }
}

/// Loads image URLs of one entry in upload order.
pub(crate) fn load_image_urls_for_entry(
    conn: &Connection,
    entry_uuid: &str,
) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT image_url
         FROM journal_entry_images
         WHERE entry_uuid = ?1
         ORDER BY uploaded_at ASC, rowid ASC;",
    )?;
    let urls = stmt
        .query_map([entry_uuid], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(urls)
}

fn parse_image_row(row: &Row<'_>) -> RepoResult<EntryImage> {
    let uuid_text: String = row.get("uuid")?;
    let entry_text: String = row.get("entry_uuid")?;
    Ok(EntryImage {
        uuid: parse_uuid(&uuid_text, "journal_entry_images.uuid")?,
        entry_id: parse_uuid(&entry_text, "journal_entry_images.entry_uuid")?,
        image_url: row.get("image_url")?,
        uploaded_at: row.get("uploaded_at")?,
    })
}
