//! Blob storage collaborator contract.
//!
//! # Responsibility
//! - Describe the upload/delete/compress calls the image pipeline makes.
//! - Keep storage mechanics (containers, CDNs, codecs) outside the core.
//!
//! # Invariants
//! - The core validates uploads before calling any method here.

use crate::model::image::ImageUpload;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backend could not be reached or refused the request.
    Unavailable(String),
    /// Referenced blob does not exist.
    MissingBlob(String),
    /// Image bytes could not be decoded or re-encoded.
    Processing(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "blob storage unavailable: {message}"),
            Self::MissingBlob(url) => write!(f, "blob not found: {url}"),
            Self::Processing(message) => write!(f, "image processing failed: {message}"),
        }
    }
}

impl Error for StorageError {}

/// Blob storage backend used for entry images.
pub trait BlobStorage {
    /// Stores `bytes` under a name derived from `file_name`; returns the public URL.
    fn upload(&self, bytes: &[u8], file_name: &str) -> Result<String, StorageError>;
    /// Removes the blob behind `url`.
    fn delete(&self, url: &str) -> Result<(), StorageError>;
    /// Produces the compressed/resized bytes that will actually be stored.
    fn compress_and_resize(&self, image: &ImageUpload) -> Result<Vec<u8>, StorageError>;
}

impl<T: BlobStorage + ?Sized> BlobStorage for &T {
    fn upload(&self, bytes: &[u8], file_name: &str) -> Result<String, StorageError> {
        (**self).upload(bytes, file_name)
    }

    fn delete(&self, url: &str) -> Result<(), StorageError> {
        (**self).delete(url)
    }

    fn compress_and_resize(&self, image: &ImageUpload) -> Result<Vec<u8>, StorageError> {
        (**self).compress_and_resize(image)
    }
}
