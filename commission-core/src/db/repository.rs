use async_trait::async_trait;
use thiserror::Error;

use crate::{GroupKey, RecordId, RecordSnapshot};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A saved snapshot together with its storage id and group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: i64,
    pub key: GroupKey,
    pub snapshot: RecordSnapshot,
}

/// Storage for record snapshots.
///
/// Records are identified in storage by `(group key, record id)`; saving
/// the same record again replaces the stored row, including its
/// `sequence_no` after a renumbering.
#[async_trait]
pub trait CommissionRepository: Send + Sync {
    /// Inserts or replaces a snapshot and returns its storage id.
    async fn save_record(
        &self,
        key: &GroupKey,
        snapshot: &RecordSnapshot,
    ) -> Result<i64, RepositoryError>;

    async fn get_record(
        &self,
        id: i64,
    ) -> Result<StoredRecord, RepositoryError>;

    /// Records of one group in `sequence_no` order.
    async fn list_records(
        &self,
        key: &GroupKey,
    ) -> Result<Vec<StoredRecord>, RepositoryError>;

    async fn delete_record(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError>;

    /// Deletes the stored records of `key` whose record id is not in `keep`
    /// and returns how many were deleted. An empty `keep` clears the group.
    async fn retain_records(
        &self,
        key: &GroupKey,
        keep: &[RecordId],
    ) -> Result<u64, RepositoryError>;

    /// Every group with at least one stored record, sorted.
    async fn list_groups(&self) -> Result<Vec<GroupKey>, RepositoryError>;
}
