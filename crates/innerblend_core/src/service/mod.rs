//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Run the ownership guard before any owned resource is read or changed.
//! - Keep hosts decoupled from storage details.

pub mod entry_service;
pub mod error;
pub mod image_service;
pub mod journal_service;
pub mod reminder_service;
pub mod user_service;
