//! Core domain logic for the InnerBlend journal.
//! This crate is the single source of truth for ownership, tag and entry
//! invariants; hosts only translate requests and responses.

pub mod access;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use access::{Actor, CredentialError, CredentialStore};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::entry::{JournalEntry, Mood};
pub use model::image::{EntryImage, ImagePolicy, ImageUpload};
pub use model::journal::Journal;
pub use model::reminder::Reminder;
pub use model::tag::Tag;
pub use model::user::UserProfile;
pub use model::ResourceKind;
pub use repo::entry_repo::SqliteEntryRepository;
pub use repo::error::{RepoError, RepoResult};
pub use repo::image_repo::SqliteImageRepository;
pub use repo::journal_repo::SqliteJournalRepository;
pub use repo::reminder_repo::SqliteReminderRepository;
pub use repo::user_repo::SqliteUserRepository;
pub use service::entry_service::EntryService;
pub use service::error::{ServiceError, ServiceResult};
pub use service::image_service::ImageService;
pub use service::journal_service::JournalService;
pub use service::reminder_service::ReminderService;
pub use service::user_service::UserService;
pub use storage::{BlobStorage, StorageError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
