//! Entry image pipeline.
//!
//! # Responsibility
//! - Validate uploads, push them through blob storage and record the URLs.
//! - Replace and delete stored images of an entry.
//!
//! # Invariants
//! - Every upload in a batch passes `ImagePolicy` before any storage call.
//! - Image operations require ownership of the entry's journal.
//! - A failed row insert deletes the blobs uploaded for that batch.

use crate::access::{ensure_owner, Actor};
use crate::model::entry::EntryId;
use crate::model::image::{EntryImage, ImagePolicy, ImageUpload};
use crate::model::now_epoch_ms;
use crate::model::ResourceKind;
use crate::repo::image_repo::ImageRepository;
use crate::service::error::{ServiceError, ServiceResult};
use crate::storage::BlobStorage;
use log::{info, warn};

const EMPTY_BATCH: &str = "at least one image is required";

/// Image service facade over a repository and a blob storage backend.
pub struct ImageService<R: ImageRepository, S: BlobStorage> {
    repo: R,
    storage: S,
    policy: ImagePolicy,
}

impl<R: ImageRepository, S: BlobStorage> ImageService<R, S> {
    pub fn new(repo: R, storage: S, policy: ImagePolicy) -> Self {
        Self {
            repo,
            storage,
            policy,
        }
    }

    pub fn policy(&self) -> &ImagePolicy {
        &self.policy
    }

    pub fn list_images(&self, actor: &Actor, entry_id: EntryId) -> ServiceResult<Vec<EntryImage>> {
        self.ensure_entry_owner(actor, entry_id)?;
        Ok(self.repo.list_images(entry_id)?)
    }

    /// Stores every upload and attaches the resulting URLs to the entry.
    pub fn attach_images(
        &self,
        actor: &Actor,
        entry_id: EntryId,
        uploads: &[ImageUpload],
    ) -> ServiceResult<Vec<EntryImage>> {
        self.ensure_entry_owner(actor, entry_id)?;
        self.check_batch(uploads)?;

        let mut images = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.store(upload) {
                Ok(url) => images.push(EntryImage::new(entry_id, url)),
                Err(err) => {
                    self.discard_blobs(images.iter().map(|image| image.image_url.as_str()));
                    return Err(err);
                }
            }
        }

        if let Err(err) = self.repo.insert_images(&images) {
            self.discard_blobs(images.iter().map(|image| image.image_url.as_str()));
            return Err(err.into());
        }

        info!(
            "event=image_attach module=service status=ok entry_id={} count={}",
            entry_id,
            images.len()
        );
        Ok(images)
    }

    /// Swaps the blob behind `image_url` for a new upload.
    pub fn replace_image(
        &self,
        actor: &Actor,
        entry_id: EntryId,
        image_url: &str,
        upload: &ImageUpload,
    ) -> ServiceResult<EntryImage> {
        self.ensure_entry_owner(actor, entry_id)?;
        self.policy.check(upload)?;

        let mut image = self
            .repo
            .find_image(entry_id, image_url)?
            .ok_or_else(|| ServiceError::not_found(ResourceKind::Image, image_url))?;

        self.storage.delete(&image.image_url)?;
        let new_url = self.store(upload)?;
        let uploaded_at = now_epoch_ms();
        self.repo
            .replace_image_url(image.uuid, &new_url, uploaded_at)?;

        image.image_url = new_url;
        image.uploaded_at = uploaded_at;
        info!(
            "event=image_replace module=service status=ok entry_id={} image_id={}",
            entry_id, image.uuid
        );
        Ok(image)
    }

    /// Deletes the entry's images whose URL is listed; unknown URLs are
    /// skipped. Returns how many images were removed.
    pub fn delete_images(
        &self,
        actor: &Actor,
        entry_id: EntryId,
        image_urls: &[String],
    ) -> ServiceResult<usize> {
        self.ensure_entry_owner(actor, entry_id)?;
        if image_urls.is_empty() {
            return Err(ServiceError::validation(EMPTY_BATCH));
        }

        let matching: Vec<String> = self
            .repo
            .list_images(entry_id)?
            .into_iter()
            .map(|image| image.image_url)
            .filter(|url| image_urls.contains(url))
            .collect();

        for url in &matching {
            self.storage.delete(url)?;
        }
        let removed = self.repo.delete_images(entry_id, &matching)?;
        info!(
            "event=image_delete module=service status=ok entry_id={} requested={} removed={}",
            entry_id,
            image_urls.len(),
            removed
        );
        Ok(removed)
    }

    fn check_batch(&self, uploads: &[ImageUpload]) -> ServiceResult<()> {
        if uploads.is_empty() {
            return Err(ServiceError::validation(EMPTY_BATCH));
        }
        for upload in uploads {
            self.policy.check(upload)?;
        }
        Ok(())
    }

    fn store(&self, upload: &ImageUpload) -> ServiceResult<String> {
        let bytes = self.storage.compress_and_resize(upload)?;
        Ok(self.storage.upload(&bytes, &upload.file_name)?)
    }

    fn discard_blobs<'a>(&self, urls: impl Iterator<Item = &'a str>) {
        for url in urls {
            if let Err(err) = self.storage.delete(url) {
                warn!(
                    "event=image_cleanup module=service status=error error={}",
                    err
                );
            }
        }
    }

    fn ensure_entry_owner(&self, actor: &Actor, entry_id: EntryId) -> ServiceResult<()> {
        actor.require_user_id()?;
        let owner_id = self.repo.entry_owner(entry_id)?;
        ensure_owner(actor, owner_id.as_deref(), ResourceKind::Entry, entry_id)
    }
}
