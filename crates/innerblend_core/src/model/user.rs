//! User profile model.
//!
//! Credentials are not part of the profile; they live with the identity
//! provider behind `CredentialStore`.

use serde::{Deserialize, Serialize};

/// Stable user identifier issued by the identity provider.
pub type UserId = String;

/// Profile record owned by the journal core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    /// Login name; kept equal to the email on profile edits.
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
