use crate::error::{Result, RosterError};
use crate::models::StudentRecord;
use crate::preview::PreviewState;
use crate::store::{StoreError, StudentStore};

pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOptions {
    pub batch_size: usize,
    /// Insert the first record alone (and roll it back) before the run.
    pub probe: bool,
}

impl Default for CommitOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            probe: true,
        }
    }
}

/// Reported after every batch the store accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub batch_index: usize,
    pub imported: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    pub imported: usize,
    pub total: usize,
    pub batches: usize,
}

/// Split records into ordered, non-overlapping chunks of at most `batch_size`.
pub fn partition(records: &[StudentRecord], batch_size: usize) -> Vec<&[StudentRecord]> {
    records.chunks(batch_size.max(1)).collect()
}

/// An unreachable store is a `Connection` error. A refused row is reported
/// against the batch it belongs to.
pub fn store_failure(err: StoreError, batch_index: usize, imported: usize, total: usize) -> RosterError {
    match err {
        StoreError::Unavailable(detail) => RosterError::Connection(detail),
        StoreError::Rejected(detail) => RosterError::BatchInsert {
            batch_index,
            imported,
            total,
            detail,
        },
    }
}

/// Commit the preview's records to `store`, one batch at a time.
///
/// Batches that were accepted before a failure stay committed; the error
/// carries how many records made it in.
pub fn commit(
    preview: &mut PreviewState,
    store: &mut dyn StudentStore,
    options: CommitOptions,
    mut on_progress: impl FnMut(Progress),
) -> Result<CommitSummary> {
    preview.begin_commit()?;
    let result = run(preview.records(), store, options, &mut on_progress);
    preview.finish_commit(result.is_ok());
    result
}

fn run(
    records: &[StudentRecord],
    store: &mut dyn StudentStore,
    options: CommitOptions,
    on_progress: &mut dyn FnMut(Progress),
) -> Result<CommitSummary> {
    let total = records.len();

    if options.probe {
        if let Some(first) = records.first() {
            store.probe(first).map_err(|e| {
                tracing::error!(error = %e, "pre-commit check failed");
                store_failure(e, 0, 0, total)
            })?;
        }
    }

    let batches = partition(records, options.batch_size);
    let mut imported = 0;
    for (batch_index, batch) in batches.iter().enumerate() {
        match store.insert(batch) {
            Ok(n) => {
                imported += n;
                tracing::debug!(batch = batch_index + 1, imported, total, "batch committed");
                on_progress(Progress {
                    batch_index,
                    imported,
                    total,
                });
            }
            Err(e) => {
                tracing::error!(batch = batch_index + 1, imported, total, error = %e, "batch rejected");
                return Err(RosterError::BatchInsert {
                    batch_index,
                    imported,
                    total,
                    detail: e.to_string(),
                });
            }
        }
    }

    tracing::info!(imported, batches = batches.len(), "commit finished");
    Ok(CommitSummary {
        imported,
        total,
        batches: batches.len(),
    })
}
