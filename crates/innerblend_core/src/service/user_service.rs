//! User profile service.
//!
//! # Responsibility
//! - Register profiles and hand passwords to the credential store.
//! - Read, edit and delete the acting user's own profile.
//! - Change the acting user's password after checking the old one.
//!
//! # Invariants
//! - Email and username are unique across users.
//! - Editing the email also rewrites the username to the same value.
//! - Passwords never reach the profile store or the logs.

use crate::access::{Actor, CredentialStore};
use crate::model::now_epoch_ms;
use crate::model::user::{UserId, UserProfile};
use crate::model::ResourceKind;
use crate::repo::user_repo::{UserConflict, UserRepository};
use crate::service::error::{optional_text, require_text, ServiceError, ServiceResult};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    /// Identity-provider id; a UUID is issued when absent.
    pub id: Option<UserId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Partial profile edit; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Also becomes the username.
    pub email: Option<String>,
    /// A blank phone number clears it.
    pub phone_number: Option<String>,
}

/// Password change form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_new_password: Option<String>,
}

pub struct UserService<R: UserRepository, C: CredentialStore> {
    repo: R,
    credentials: C,
}

impl<R: UserRepository, C: CredentialStore> UserService<R, C> {
    pub fn new(repo: R, credentials: C) -> Self {
        Self { repo, credentials }
    }

    pub fn register(&self, request: RegisterRequest) -> ServiceResult<UserProfile> {
        let first_name = require_field(request.first_name, "first name is required")?;
        let last_name = require_field(request.last_name, "last name is required")?;
        let username = require_field(request.username, "username is required")?;
        let email = require_email(request.email.as_deref().unwrap_or_default())?;
        let password = request.password.unwrap_or_default();
        if password.is_empty() {
            return Err(ServiceError::validation("password is required"));
        }
        if request.confirm_password.as_deref() != Some(password.as_str()) {
            return Err(ServiceError::validation(
                "the password and confirmation password do not match",
            ));
        }

        let id = match request.id {
            Some(id) => require_text(&id, "user id must not be blank")?,
            None => Uuid::new_v4().to_string(),
        };
        self.reject_conflicts(&username, &email, None)?;

        let now = now_epoch_ms();
        let user = UserProfile {
            id,
            username,
            email,
            first_name,
            last_name,
            phone_number: optional_text(request.phone_number),
            created_at: now,
            updated_at: now,
        };
        self.repo.create_user(&user)?;
        if let Err(err) = self.credentials.set_password(&user.id, &password) {
            // Registration is all-or-nothing.
            if let Err(cleanup) = self.repo.delete_user(&user.id) {
                warn!(
                    "event=user_register module=service status=error stage=cleanup error={}",
                    cleanup
                );
            }
            return Err(err.into());
        }
        info!("event=user_register module=service status=ok user_id={}", user.id);

        Ok(user)
    }

    pub fn get_profile(&self, actor: &Actor) -> ServiceResult<UserProfile> {
        let user_id = actor.require_user_id()?;
        self.repo
            .get_user(user_id)?
            .ok_or_else(|| ServiceError::not_found(ResourceKind::User, user_id))
    }

    pub fn update_profile(
        &self,
        actor: &Actor,
        request: UpdateProfileRequest,
    ) -> ServiceResult<UserProfile> {
        let mut user = self.get_profile(actor)?;

        if let Some(first_name) = request.first_name {
            user.first_name = require_text(&first_name, "first name is required")?;
        }
        if let Some(last_name) = request.last_name {
            user.last_name = require_text(&last_name, "last name is required")?;
        }
        if let Some(email) = request.email {
            let email = require_email(&email)?;
            self.reject_conflicts(&email, &email, Some(&user.id))?;
            user.username = email.clone();
            user.email = email;
        }
        if let Some(phone_number) = request.phone_number {
            user.phone_number = optional_text(Some(phone_number));
        }
        user.updated_at = now_epoch_ms().max(user.updated_at);

        self.repo.update_user(&user)?;
        info!("event=user_update module=service status=ok user_id={}", user.id);
        Ok(user)
    }

    /// Replaces the actor's password and bumps the profile's `updated_at`.
    pub fn change_password(
        &self,
        actor: &Actor,
        request: ChangePasswordRequest,
    ) -> ServiceResult<UserProfile> {
        let mut user = self.get_profile(actor)?;
        let new_password = request.new_password.unwrap_or_default();
        let old_password = request.old_password.unwrap_or_default();
        if new_password.is_empty() {
            return Err(ServiceError::validation("new password is required"));
        }
        if old_password.is_empty() {
            return Err(ServiceError::validation(
                "enter the old password before choosing a new one",
            ));
        }
        if !self.credentials.verify_password(&user.id, &old_password)? {
            return Err(ServiceError::validation("old password is incorrect"));
        }
        if old_password == new_password {
            return Err(ServiceError::validation(
                "new password cannot be the same as the old password",
            ));
        }
        if request.confirm_new_password.as_deref() != Some(new_password.as_str()) {
            return Err(ServiceError::validation(
                "new password and confirmation password do not match",
            ));
        }

        self.credentials.set_password(&user.id, &new_password)?;
        user.updated_at = now_epoch_ms().max(user.updated_at);
        self.repo.update_user(&user)?;
        info!("event=password_change module=service status=ok user_id={}", user.id);
        Ok(user)
    }

    /// Deletes the actor's account and everything it owns; returns image URLs
    /// left behind in blob storage.
    pub fn delete_account(&self, actor: &Actor) -> ServiceResult<Vec<String>> {
        let user_id = actor.require_user_id()?;
        let orphaned_image_urls = self.repo.delete_user(user_id)?;
        info!(
            "event=user_delete module=service status=ok user_id={} orphaned_images={}",
            user_id,
            orphaned_image_urls.len()
        );
        Ok(orphaned_image_urls)
    }

    fn reject_conflicts(
        &self,
        username: &str,
        email: &str,
        exclude_id: Option<&str>,
    ) -> ServiceResult<()> {
        let conflicts = self.repo.find_conflicts(username, email, exclude_id)?;
        match conflicts.first() {
            Some(UserConflict::Email) => Err(ServiceError::Conflict("email already exists".to_string())),
            Some(UserConflict::Username) => {
                Err(ServiceError::Conflict("username already exists".to_string()))
            }
            None => Ok(()),
        }
    }
}

fn require_field(value: Option<String>, message: &str) -> ServiceResult<String> {
    require_text(value.as_deref().unwrap_or_default(), message)
}

fn require_email(value: &str) -> ServiceResult<String> {
    let email = require_text(value, "email is required")?;
    if !EMAIL_RE.is_match(&email) {
        return Err(ServiceError::validation("email address is not valid"));
    }
    Ok(email)
}
