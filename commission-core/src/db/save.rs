use thiserror::Error;
use tracing::{error, info};

use super::repository::{CommissionRepository, RepositoryError};
use crate::{GroupKey, RecordId, RecordSnapshot};

/// A batch save stopped at its first failing record.
///
/// Records before the failure stay saved; nothing after it was attempted.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("saving record {failed_record} failed after {} saved: {source}", .saved.len())]
pub struct SaveError {
    /// Storage ids of the records saved before the failure, in order.
    pub saved: Vec<i64>,
    pub failed_record: RecordId,
    #[source]
    pub source: RepositoryError,
}

/// Saves `snapshots` one at a time in order and returns their storage ids.
///
/// The loop is not transactional: on the first error it stops, leaves the
/// already-saved records in place and reports them in [`SaveError`].
pub async fn save_all(
    repo: &dyn CommissionRepository,
    key: &GroupKey,
    snapshots: &[RecordSnapshot],
) -> Result<Vec<i64>, SaveError> {
    let mut saved = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        match repo.save_record(key, snapshot).await {
            Ok(id) => saved.push(id),
            Err(source) => {
                error!(group = %key, record = snapshot.id, %source, "save failed");
                return Err(SaveError {
                    saved,
                    failed_record: snapshot.id,
                    source,
                });
            }
        }
    }
    info!(group = %key, count = saved.len(), "records saved");
    Ok(saved)
}
