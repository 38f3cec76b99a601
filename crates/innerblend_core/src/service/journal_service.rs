//! Journal use-case service.
//!
//! # Responsibility
//! - Create, read, partially update and delete journals for one actor.
//!
//! # Invariants
//! - Every single-journal operation runs the ownership guard first.
//! - Journal titles are never blank.
//! - Updates overwrite only the fields the request supplies.

use crate::access::{ensure_owner, Actor};
use crate::model::journal::{Journal, JournalId};
use crate::model::now_epoch_ms;
use crate::model::user::UserProfile;
use crate::model::ResourceKind;
use crate::repo::journal_repo::{JournalDeletion, JournalRepository, JournalSummary};
use crate::service::error::{optional_text, require_text, ServiceError, ServiceResult};
use log::info;
use serde::{Deserialize, Serialize};

const TITLE_REQUIRED: &str = "journal title is required";

/// Input for journal creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateJournalRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Partial journal update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateJournalRequest {
    pub title: Option<String>,
    /// A blank description clears it.
    pub description: Option<String>,
}

/// Created journal together with its resolved owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalWithOwner {
    pub journal: Journal,
    pub owner: UserProfile,
}

/// Journal service facade over repository implementations.
pub struct JournalService<R: JournalRepository> {
    repo: R,
}

impl<R: JournalRepository> JournalService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a journal owned by `actor`.
    ///
    /// Actors without a stored profile are treated as unauthenticated.
    pub fn create_journal(
        &self,
        actor: &Actor,
        request: CreateJournalRequest,
    ) -> ServiceResult<JournalWithOwner> {
        let owner_id = actor.require_user_id()?;
        let title = require_text(request.title.as_deref().unwrap_or_default(), TITLE_REQUIRED)?;
        let owner = self
            .repo
            .owner_profile(owner_id)?
            .ok_or(ServiceError::Unauthenticated)?;

        let journal = Journal::new(owner_id, title, optional_text(request.description));
        self.repo.create_journal(&journal)?;
        info!(
            "event=journal_create module=service status=ok journal_id={}",
            journal.uuid
        );

        Ok(JournalWithOwner { journal, owner })
    }

    /// Lists the actor's journals, most recently modified first.
    pub fn list_journals(&self, actor: &Actor) -> ServiceResult<Vec<JournalSummary>> {
        let owner_id = actor.require_user_id()?;
        Ok(self.repo.list_journals(owner_id)?)
    }

    pub fn get_journal(&self, actor: &Actor, journal_id: JournalId) -> ServiceResult<Journal> {
        self.load_owned(actor, journal_id)
    }

    /// Applies a partial update and re-stamps `updated_at`.
    pub fn update_journal(
        &self,
        actor: &Actor,
        journal_id: JournalId,
        request: UpdateJournalRequest,
    ) -> ServiceResult<Journal> {
        let mut journal = self.load_owned(actor, journal_id)?;

        if let Some(title) = request.title {
            journal.title = require_text(&title, TITLE_REQUIRED)?;
        }
        if let Some(description) = request.description {
            journal.description = optional_text(Some(description));
        }
        journal.updated_at = now_epoch_ms().max(journal.updated_at);

        self.repo.update_journal(&journal)?;
        info!(
            "event=journal_update module=service status=ok journal_id={}",
            journal.uuid
        );
        Ok(journal)
    }

    /// Deletes a journal with all of its entries, tag links and image rows.
    pub fn delete_journal(
        &self,
        actor: &Actor,
        journal_id: JournalId,
    ) -> ServiceResult<JournalDeletion> {
        self.load_owned(actor, journal_id)?;
        let deletion = self.repo.delete_journal(journal_id)?;
        info!(
            "event=journal_delete module=service status=ok journal_id={} deleted_entries={} orphaned_images={}",
            journal_id,
            deletion.deleted_entries,
            deletion.orphaned_image_urls.len()
        );
        Ok(deletion)
    }

    fn load_owned(&self, actor: &Actor, journal_id: JournalId) -> ServiceResult<Journal> {
        actor.require_user_id()?;
        let journal = self.repo.get_journal(journal_id)?;
        ensure_owner(
            actor,
            journal.as_ref().map(|journal| journal.owner_id.as_str()),
            ResourceKind::Journal,
            journal_id,
        )?;
        journal.ok_or(ServiceError::InconsistentState(
            "journal passed ownership check but was not loaded",
        ))
    }
}
