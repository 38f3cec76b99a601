//! Service error taxonomy shared by every use-case service.
//!
//! # Invariants
//! - Ownership mismatches are reported as `NotFound`, never as a distinct
//!   "forbidden" outcome.
//! - Persistence failures abort the whole operation; nothing is partially
//!   committed.

use crate::access::CredentialError;
use crate::model::image::ImageRejection;
use crate::model::ResourceKind;
use crate::repo::error::RepoError;
use crate::storage::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing failure of a service operation.
#[derive(Debug)]
pub enum ServiceError {
    /// No, blank or unknown actor identity.
    Unauthenticated,
    /// Resource or its parent is missing, or belongs to someone else.
    NotFound { resource: ResourceKind, id: String },
    /// Request failed field or upload validation.
    Validation(String),
    /// Unique profile field already in use.
    Conflict(String),
    /// Blob storage collaborator failure.
    Storage(StorageError),
    /// Credential collaborator failure.
    Credential(CredentialError),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Read-back after a successful write did not find the row.
    InconsistentState(&'static str),
}

impl ServiceError {
    /// Stable machine-readable code for structured responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "storage",
            Self::Credential(_) => "credential",
            Self::Repo(_) => "persistence",
            Self::InconsistentState(_) => "inconsistent_state",
        }
    }

    pub(crate) fn not_found(resource: ResourceKind, id: impl Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "you are not logged in"),
            Self::NotFound { resource, id } => write!(f, "{resource} not found: {id}"),
            Self::Validation(message) => write!(f, "{message}"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Credential(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent journal state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Credential(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { resource, id } => Self::NotFound { resource, id },
            RepoError::Conflict { field } => Self::Conflict(format!("{field} already exists")),
            other => Self::Repo(other),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<CredentialError> for ServiceError {
    fn from(value: CredentialError) -> Self {
        Self::Credential(value)
    }
}

impl From<ImageRejection> for ServiceError {
    fn from(value: ImageRejection) -> Self {
        Self::Validation(value.to_string())
    }
}

/// Trims a required text field; blank values fail validation with `message`.
pub(crate) fn require_text(value: &str, message: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(message));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field; blank values become `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
