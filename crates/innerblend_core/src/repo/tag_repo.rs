//! Tag reconciliation and entry-tag link persistence.
//!
//! # Responsibility
//! - Map raw tag names to the owner's canonical tag rows, creating missing
//!   ones.
//! - Build or fully replace an entry's tag links.
//!
//! # Invariants
//! - Names are normalized (`trim` + lowercase) and deduplicated first.
//! - Lookups and inserts are scoped to one owner; two users never share a tag
//!   row.
//! - Functions here run on the caller's transaction; the caller commits the
//!   entry write, new tags and links together.
//! - New tags are written with `INSERT OR IGNORE` against
//!   `UNIQUE(user_id, name)` and then re-read, so a concurrent writer that
//!   created the same tag first is reused instead of duplicated.

use crate::model::entry::EntryId;
use crate::model::tag::{normalize_tag_names, Tag};
use crate::repo::error::RepoResult;
use crate::repo::support::{parse_uuid, placeholders};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;

/// How links are written for the reconciled set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Entry was just inserted and has no links yet.
    Create,
    /// Drop every existing link of the entry before linking.
    Replace,
}

/// Result of reconciling one entry's tag list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReconciliation {
    /// Canonical tags now linked to the entry, sorted by name.
    pub tags: Vec<Tag>,
    /// Number of tag rows created by this call.
    pub created: usize,
}

/// Reconciles `raw_names` for `owner_id` and links the result to `entry_id`.
pub(crate) fn reconcile_entry_tags<S: AsRef<str>>(
    conn: &Connection,
    owner_id: &str,
    entry_id: EntryId,
    raw_names: &[S],
    mode: LinkMode,
) -> RepoResult<TagReconciliation> {
    let names = normalize_tag_names(raw_names);
    let reconciliation = resolve_tags(conn, owner_id, &names)?;

    let entry_text = entry_id.to_string();
    if mode == LinkMode::Replace {
        conn.execute(
            "DELETE FROM journal_entry_tags WHERE entry_uuid = ?1;",
            [entry_text.as_str()],
        )?;
    }
    for tag in &reconciliation.tags {
        conn.execute(
            "INSERT OR IGNORE INTO journal_entry_tags (entry_uuid, tag_uuid)
             VALUES (?1, ?2);",
            params![entry_text.as_str(), tag.uuid.to_string()],
        )?;
    }

    Ok(reconciliation)
}

/// Finds or creates the owner's tags for already-normalized `names`.
pub(crate) fn resolve_tags(
    conn: &Connection,
    owner_id: &str,
    names: &[String],
) -> RepoResult<TagReconciliation> {
    if names.is_empty() {
        return Ok(TagReconciliation {
            tags: Vec::new(),
            created: 0,
        });
    }

    let existing = find_owner_tags(conn, owner_id, names)?;
    let known: BTreeSet<&str> = existing.iter().map(|tag| tag.name.as_str()).collect();

    let mut created = 0;
    for name in names.iter().filter(|name| !known.contains(name.as_str())) {
        let tag = Tag::new(owner_id, name.as_str());
        created += conn.execute(
            "INSERT OR IGNORE INTO tags (uuid, user_id, name) VALUES (?1, ?2, ?3);",
            params![tag.uuid.to_string(), tag.owner_id.as_str(), tag.name.as_str()],
        )?;
    }

    let tags = if created == 0 && existing.len() == names.len() {
        existing
    } else {
        find_owner_tags(conn, owner_id, names)?
    };

    Ok(TagReconciliation { tags, created })
}

/// Returns the owner's tags whose names are in `names`, sorted by name.
pub(crate) fn find_owner_tags(
    conn: &Connection,
    owner_id: &str,
    names: &[String],
) -> RepoResult<Vec<Tag>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT uuid, user_id, name
         FROM tags
         WHERE user_id = ? AND name IN ({})
         ORDER BY name ASC;",
        placeholders(names.len())
    );
    let mut bind_values = Vec::with_capacity(names.len() + 1);
    bind_values.push(Value::Text(owner_id.to_string()));
    bind_values.extend(names.iter().map(|name| Value::Text(name.clone())));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(parse_tag_row(row)?);
    }
    Ok(tags)
}

/// Lists every tag owned by `owner_id`, sorted by name.
pub(crate) fn list_owner_tags(conn: &Connection, owner_id: &str) -> RepoResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT uuid, user_id, name
         FROM tags
         WHERE user_id = ?1
         ORDER BY name ASC;",
    )?;
    let mut rows = stmt.query([owner_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(parse_tag_row(row)?);
    }
    Ok(tags)
}

/// Loads the tag names linked to one entry, sorted.
pub(crate) fn load_tag_names_for_entry(
    conn: &Connection,
    entry_uuid: &str,
) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM journal_entry_tags et
         INNER JOIN tags t ON t.uuid = et.tag_uuid
         WHERE et.entry_uuid = ?1
         ORDER BY t.name ASC;",
    )?;
    let names = stmt
        .query_map([entry_uuid], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<Tag> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Tag {
        uuid: parse_uuid(&uuid_text, "tags.uuid")?,
        owner_id: row.get("user_id")?,
        name: row.get("name")?,
    })
}
