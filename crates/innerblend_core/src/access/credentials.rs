//! Credential collaborator contract.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by the identity provider when storing credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialError(pub String);

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "credential store failure: {}", self.0)
    }
}

impl Error for CredentialError {}

/// Identity-provider side of registration and password changes. Hashing and
/// token issuance live behind this trait.
pub trait CredentialStore {
    /// Stores `password` as the user's current password, replacing any
    /// previous one.
    fn set_password(&self, user_id: &str, password: &str) -> Result<(), CredentialError>;
    /// Reports whether `password` is the user's current password.
    fn verify_password(&self, user_id: &str, password: &str) -> Result<bool, CredentialError>;
}

impl<T: CredentialStore + ?Sized> CredentialStore for &T {
    fn set_password(&self, user_id: &str, password: &str) -> Result<(), CredentialError> {
        (**self).set_password(user_id, password)
    }

    fn verify_password(&self, user_id: &str, password: &str) -> Result<bool, CredentialError> {
        (**self).verify_password(user_id, password)
    }
}
