//! Ownership guard shared by all services.

use crate::model::ResourceKind;
use crate::service::error::ServiceError;
use log::debug;
use std::fmt::Display;

/// Caller identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Actor {
    user_id: Option<String>,
}

impl Actor {
    /// Builds an actor from the provider's name-identifier claim.
    ///
    /// Missing or blank claims produce an anonymous actor.
    pub fn from_claim(claim: Option<&str>) -> Self {
        let user_id = claim
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Self { user_id }
    }

    pub fn user(user_id: impl AsRef<str>) -> Self {
        Self::from_claim(Some(user_id.as_ref()))
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Returns the user id, or `Unauthenticated` for anonymous actors.
    pub fn require_user_id(&self) -> Result<&str, ServiceError> {
        self.user_id().ok_or(ServiceError::Unauthenticated)
    }
}

/// Guard decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied,
}

impl Access {
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }
}

/// Decides whether `actor` may touch a resource owned by `owner_id`.
///
/// `owner_id` is `None` when the resource (or the parent that carries its
/// owner) could not be found; that case is denied.
pub fn authorize(actor: &Actor, owner_id: Option<&str>) -> Access {
    match (actor.user_id(), owner_id) {
        (Some(actor_id), Some(owner_id)) if actor_id == owner_id => Access::Allowed,
        _ => Access::Denied,
    }
}

/// Runs `authorize` and maps the outcome to service errors.
///
/// Anonymous actors get `Unauthenticated`. Every other denial is reported as
/// `NotFound` for `resource`/`id`, so foreign resources are indistinguishable
/// from missing ones.
pub fn ensure_owner(
    actor: &Actor,
    owner_id: Option<&str>,
    resource: ResourceKind,
    id: impl Display,
) -> Result<(), ServiceError> {
    if !actor.is_authenticated() {
        return Err(ServiceError::Unauthenticated);
    }

    if authorize(actor, owner_id).is_allowed() {
        return Ok(());
    }

    debug!(
        "event=access_denied module=access status=denied resource={} owner_resolved={}",
        resource.as_str().replace(' ', "_"),
        owner_id.is_some()
    );
    Err(ServiceError::NotFound {
        resource,
        id: id.to_string(),
    })
}
