//! bookshelf-rs: a local book library with reviews, moderation and reading
//! progress.
//!
//! The crate is built around [`LibraryStore`], a single-user state
//! container that keeps every collection in memory and rewrites it to
//! local key-value storage after each change.
//!
//! # Features
//!
//! - Book catalog with import and partial updates
//! - Role-based moderation (block, unblock, flag, approve) with an audit log
//! - Terms acceptance records per book
//! - Reviews with helpful votes
//! - Favorites, reading progress and search history
//! - Reading statistics
//! - Custom UI color themes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Sessions and roles.
pub mod auth;
/// Configuration and CLI.
pub mod config;
/// Local storage.
pub mod db;
/// Error types.
pub mod error;
/// Library entities.
pub mod library;
/// User-facing notifications.
pub mod notify;
/// Application state store.
pub mod store;

#[cfg(test)]
mod tests;

pub use config::{Cli, Command, Config};
pub use db::{Database, Storage, StorageKey};
pub use error::{AppError, Result};
pub use store::{LibraryState, LibraryStore};
