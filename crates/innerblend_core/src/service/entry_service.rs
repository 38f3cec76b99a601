//! Journal entry use-case service.
//!
//! # Responsibility
//! - Create, read, update, move and delete entries for one actor.
//! - Drive tag reconciliation for the entry's tag list.
//!
//! # Invariants
//! - Entry access is authorized through the parent journal's owner.
//! - Title and content are never blank.
//! - Updates overwrite only supplied scalar fields. The tag list is always
//!   re-specified: a missing list clears every tag.
//! - Mood text that does not name a known mood is ignored: create stores no
//!   mood and update keeps the previous one.

use crate::access::{ensure_owner, Actor};
use crate::model::entry::{EntryId, JournalEntry, Mood};
use crate::model::journal::JournalId;
use crate::model::now_epoch_ms;
use crate::model::ResourceKind;
use crate::repo::entry_repo::{EntryDeletion, EntryOwnership, EntryRecord, EntryRepository};
use crate::service::error::{optional_text, require_text, ServiceError, ServiceResult};
use log::{debug, info};
use serde::Deserialize;

const TITLE_REQUIRED: &str = "entry title is required";
const CONTENT_REQUIRED: &str = "entry content is required";

/// Input for entry creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateEntryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Free-text mood, parsed leniently.
    pub mood: Option<String>,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Partial entry update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateEntryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Unknown mood text leaves the stored mood unchanged.
    pub mood: Option<String>,
    /// A blank location clears it.
    pub location: Option<String>,
    /// Full replacement tag set; `None` or an empty list removes every tag.
    pub tags: Option<Vec<String>>,
}

/// Move request: entry and destination journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MoveEntryRequest {
    pub entry_id: EntryId,
    pub journal_id: JournalId,
}

/// Entry service facade over repository implementations.
pub struct EntryService<R: EntryRepository> {
    repo: R,
}

impl<R: EntryRepository> EntryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an entry in one of the actor's journals.
    pub fn create_entry(
        &self,
        actor: &Actor,
        journal_id: JournalId,
        request: CreateEntryRequest,
    ) -> ServiceResult<EntryRecord> {
        let owner_id = self.ensure_journal_owner(actor, journal_id)?;

        let title = require_text(request.title.as_deref().unwrap_or_default(), TITLE_REQUIRED)?;
        let content = require_content(request.content.unwrap_or_default())?;

        let mut entry = JournalEntry::new(journal_id, title, content);
        entry.mood = parse_mood(request.mood.as_deref());
        entry.location = optional_text(request.location);

        let tags = request.tags.unwrap_or_default();
        let reconciliation = self.repo.create_entry(&owner_id, &entry, &tags)?;
        info!(
            "event=entry_create module=service status=ok entry_id={} journal_id={} tags={} tags_created={}",
            entry.uuid,
            journal_id,
            reconciliation.tags.len(),
            reconciliation.created
        );

        self.read_back(entry.uuid, "created entry not found in read-back")
    }

    pub fn get_entry(&self, actor: &Actor, entry_id: EntryId) -> ServiceResult<EntryRecord> {
        self.ensure_entry_owner(actor, entry_id)?;
        self.repo
            .get_entry_record(entry_id)?
            .ok_or_else(|| ServiceError::not_found(ResourceKind::Entry, entry_id))
    }

    /// Lists entries of one of the actor's journals, newest first.
    pub fn list_entries(
        &self,
        actor: &Actor,
        journal_id: JournalId,
    ) -> ServiceResult<Vec<EntryRecord>> {
        self.ensure_journal_owner(actor, journal_id)?;
        Ok(self.repo.list_entry_records(journal_id)?)
    }

    /// Applies a partial update, re-stamps `updated_at` and, when tags are
    /// supplied, re-reconciles them in full-replace mode.
    pub fn update_entry(
        &self,
        actor: &Actor,
        entry_id: EntryId,
        request: UpdateEntryRequest,
    ) -> ServiceResult<EntryRecord> {
        let ownership = self.ensure_entry_owner(actor, entry_id)?;
        let mut entry = self
            .repo
            .get_entry(entry_id)?
            .ok_or_else(|| ServiceError::not_found(ResourceKind::Entry, entry_id))?;

        if let Some(title) = request.title {
            entry.title = require_text(&title, TITLE_REQUIRED)?;
        }
        if let Some(content) = request.content {
            entry.content = require_content(content)?;
        }
        if let Some(location) = request.location {
            entry.location = optional_text(Some(location));
        }
        if let Some(mood) = parse_mood(request.mood.as_deref()) {
            entry.mood = Some(mood);
        }
        entry.updated_at = now_epoch_ms().max(entry.updated_at);

        let tags = request.tags.unwrap_or_default();
        let reconciliation = self.repo.update_entry(&ownership.owner_id, &entry, &tags)?;
        info!(
            "event=entry_update module=service status=ok entry_id={} tags={} tags_created={}",
            entry_id,
            reconciliation.tags.len(),
            reconciliation.created
        );

        self.read_back(entry_id, "updated entry not found in read-back")
    }

    /// Moves an entry between two journals that both belong to the actor.
    pub fn move_entry(
        &self,
        actor: &Actor,
        request: MoveEntryRequest,
    ) -> ServiceResult<EntryRecord> {
        let ownership = self.ensure_entry_owner(actor, request.entry_id)?;
        self.ensure_journal_owner(actor, request.journal_id)?;

        let updated_at = now_epoch_ms();
        self.repo
            .move_entry(request.entry_id, request.journal_id, updated_at)?;
        info!(
            "event=entry_move module=service status=ok entry_id={} from_journal_id={} to_journal_id={}",
            request.entry_id,
            ownership.journal_id,
            request.journal_id
        );

        self.read_back(request.entry_id, "moved entry not found in read-back")
    }

    /// Deletes an entry and its tag links; tag rows are kept for reuse.
    pub fn delete_entry(&self, actor: &Actor, entry_id: EntryId) -> ServiceResult<EntryDeletion> {
        self.ensure_entry_owner(actor, entry_id)?;
        let deletion = self.repo.delete_entry(entry_id)?;
        info!(
            "event=entry_delete module=service status=ok entry_id={} removed_tag_links={} orphaned_images={}",
            entry_id,
            deletion.removed_tag_links,
            deletion.orphaned_image_urls.len()
        );
        Ok(deletion)
    }

    /// Lists the actor's tag names, sorted.
    pub fn list_tags(&self, actor: &Actor) -> ServiceResult<Vec<String>> {
        let owner_id = actor.require_user_id()?;
        Ok(self
            .repo
            .list_tags(owner_id)?
            .into_iter()
            .map(|tag| tag.name)
            .collect())
    }

    fn ensure_journal_owner(&self, actor: &Actor, journal_id: JournalId) -> ServiceResult<String> {
        actor.require_user_id()?;
        let owner_id = self.repo.journal_owner(journal_id)?;
        ensure_owner(
            actor,
            owner_id.as_deref(),
            ResourceKind::Journal,
            journal_id,
        )?;
        owner_id.ok_or_else(|| ServiceError::not_found(ResourceKind::Journal, journal_id))
    }

    fn ensure_entry_owner(&self, actor: &Actor, entry_id: EntryId) -> ServiceResult<EntryOwnership> {
        actor.require_user_id()?;
        let ownership = self.repo.entry_ownership(entry_id)?;
        ensure_owner(
            actor,
            ownership.as_ref().map(|ownership| ownership.owner_id.as_str()),
            ResourceKind::Entry,
            entry_id,
        )?;
        ownership.ok_or_else(|| ServiceError::not_found(ResourceKind::Entry, entry_id))
    }

    fn read_back(&self, entry_id: EntryId, details: &'static str) -> ServiceResult<EntryRecord> {
        self.repo
            .get_entry_record(entry_id)?
            .ok_or(ServiceError::InconsistentState(details))
    }
}

fn require_content(content: String) -> ServiceResult<String> {
    if content.trim().is_empty() {
        return Err(ServiceError::validation(CONTENT_REQUIRED));
    }
    Ok(content)
}

fn parse_mood(value: Option<&str>) -> Option<Mood> {
    let value = value?;
    let mood = Mood::parse_lenient(value);
    if mood.is_none() && !value.trim().is_empty() {
        debug!("event=mood_ignored module=service status=skipped reason=unrecognized_mood");
    }
    mood
}
