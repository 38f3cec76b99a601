//! Actor identity and ownership-scoped authorization.
//!
//! # Responsibility
//! - Turn the identity provider's claim into an `Actor`.
//! - Decide access for owned resources in one place for every service.
//! - Describe the credential collaborator used at registration.
//!
//! # Invariants
//! - Decisions are deny-by-default: anonymous actors and unresolved owners
//!   are always denied.

mod credentials;
mod ownership;

pub use credentials::{CredentialError, CredentialStore};
pub use ownership::{authorize, ensure_owner, Access, Actor};
