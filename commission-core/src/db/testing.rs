//! In-memory repository shared by the storage tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{CommissionRepository, RepositoryError, StoredRecord};
use crate::{GroupKey, RecordId, RecordSnapshot};

/// Records the ids it was asked to save and fails on one chosen record id.
pub(crate) struct RecordingRepository {
    fail_on: Option<RecordId>,
    pub(crate) saved: Mutex<Vec<RecordId>>,
}

impl RecordingRepository {
    pub(crate) fn new(fail_on: Option<RecordId>) -> Self {
        Self {
            fail_on,
            saved: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CommissionRepository for RecordingRepository {
    async fn save_record(
        &self,
        _key: &GroupKey,
        snapshot: &RecordSnapshot,
    ) -> Result<i64, RepositoryError> {
        if self.fail_on == Some(snapshot.id) {
            return Err(RepositoryError::Database("disk full".to_string()));
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(snapshot.id);
        Ok(saved.len() as i64 * 10)
    }

    async fn get_record(
        &self,
        _id: i64,
    ) -> Result<StoredRecord, RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    async fn list_records(
        &self,
        _key: &GroupKey,
    ) -> Result<Vec<StoredRecord>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn delete_record(
        &self,
        _id: i64,
    ) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn retain_records(
        &self,
        _key: &GroupKey,
        keep: &[RecordId],
    ) -> Result<u64, RepositoryError> {
        let mut saved = self.saved.lock().unwrap();
        let before = saved.len();
        saved.retain(|id| keep.contains(id));
        Ok((before - saved.len()) as u64)
    }

    async fn list_groups(&self) -> Result<Vec<GroupKey>, RepositoryError> {
        Ok(Vec::new())
    }
}
