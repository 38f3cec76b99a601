//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories only accept connections migrated to the latest schema.
//! - Repositories do not authorize; services run the ownership guard first.
//! - Multi-row mutations run inside one transaction.

pub mod entry_repo;
pub mod error;
pub mod image_repo;
pub mod journal_repo;
pub mod reminder_repo;
mod support;
pub mod tag_repo;
pub mod user_repo;
