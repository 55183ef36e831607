//! Persistence port for content records.
//!
//! The core never touches storage directly; every read and write goes
//! through [`ContentRepository`]. Updates are compare-and-swap on the
//! record's storage `revision`, which every write bumps, so neither an edit
//! nor a status change can silently overwrite another. Version snapshots live beside the record and are owned by
//! [`ContentRepository::append_version`]: `get` returns them in
//! `Content::versions`, while `create` and `update` ignore that field.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::content::{Content, ContentVersion};

pub use memory::InMemoryContentRepository;
pub use postgres::PgContentRepository;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("record already exists: {0}")]
    AlreadyExists(String),

    #[error("revision conflict on {id}: expected {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Content>, RepositoryError>;

    /// Fails with `AlreadyExists` when the id is taken.
    async fn create(&self, content: &Content) -> Result<(), RepositoryError>;

    /// Replaces the stored record only if its revision still equals
    /// `content.revision`. Returns the revision now stored.
    async fn update(&self, content: &Content) -> Result<u64, RepositoryError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;

    /// Fingerprints of every stored record syndicated from `feed_id`.
    async fn list_fingerprints(&self, feed_id: &str) -> Result<HashSet<String>, RepositoryError>;

    async fn append_version(
        &self,
        content_id: &str,
        version: &ContentVersion,
    ) -> Result<(), RepositoryError>;

    /// Approved records whose `scheduled_at` is at or before `now`, oldest
    /// first. Version history is not attached.
    async fn list_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Content>, RepositoryError>;
}
