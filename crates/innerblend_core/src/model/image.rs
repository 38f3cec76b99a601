//! Entry image model and upload policy.
//!
//! # Invariants
//! - Uploads are checked against `ImagePolicy` before any storage call.

use crate::model::entry::EntryId;
use crate::model::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable image identifier.
pub type ImageId = Uuid;

/// Upload size ceiling applied when configuration does not override it.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Content types accepted when configuration does not override them.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Stored image reference attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryImage {
    pub uuid: ImageId,
    pub entry_id: EntryId,
    pub image_url: String,
    pub uploaded_at: i64,
}

impl EntryImage {
    pub fn new(entry_id: EntryId, image_url: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            entry_id,
            image_url: image_url.into(),
            uploaded_at: now_epoch_ms(),
        }
    }
}

/// Raw upload handed over by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRejection {
    Empty {
        file_name: String,
    },
    TooLarge {
        file_name: String,
        size: u64,
        max_bytes: u64,
    },
    UnsupportedContentType {
        file_name: String,
        content_type: String,
    },
}

impl Display for ImageRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { file_name } => write!(f, "file `{file_name}` is empty"),
            Self::TooLarge {
                file_name,
                size,
                max_bytes,
            } => write!(
                f,
                "file `{file_name}` is too large: {size} bytes exceeds {max_bytes}"
            ),
            Self::UnsupportedContentType {
                file_name,
                content_type,
            } => write!(f, "unsupported file type for `{file_name}`: {content_type}"),
        }
    }
}

/// Size and content-type limits for entry images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePolicy {
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|value| value.to_string())
                .collect(),
        }
    }
}

impl ImagePolicy {
    /// Checks one upload against the policy.
    ///
    /// Content types compare case-insensitively and ignore parameters such as
    /// `; charset=...`.
    pub fn check(&self, upload: &ImageUpload) -> Result<(), ImageRejection> {
        if upload.is_empty() {
            return Err(ImageRejection::Empty {
                file_name: upload.file_name.clone(),
            });
        }
        if upload.len() > self.max_bytes {
            return Err(ImageRejection::TooLarge {
                file_name: upload.file_name.clone(),
                size: upload.len(),
                max_bytes: self.max_bytes,
            });
        }

        let essence = upload
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        let allowed = self
            .allowed_content_types
            .iter()
            .any(|value| value.eq_ignore_ascii_case(essence));
        if !allowed {
            return Err(ImageRejection::UnsupportedContentType {
                file_name: upload.file_name.clone(),
                content_type: upload.content_type.clone(),
            });
        }

        Ok(())
    }
}
