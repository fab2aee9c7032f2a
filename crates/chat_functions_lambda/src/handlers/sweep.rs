use chat_functions_core::contract::SweepOutcome;
use chat_functions_core::retention::{retention_cutoff, stale_chats_query};
use chrono::{DateTime, Utc};

use crate::adapters::document_store::{DocumentStore, StoreError};

const COMPONENT: &str = "retention_sweeper";

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("failed to query stale anonymous chats: {0}")]
    Query(#[source] StoreError),
    #[error("failed to delete {count} stale anonymous chats: {source}")]
    Commit {
        count: usize,
        #[source]
        source: StoreError,
    },
}

/// Deletes every anonymous chat stamped at or before `now` minus the
/// retention window, in a single atomic batch.
///
/// The matched set is not chunked: if it exceeds the store's batch-write
/// limit the commit fails and nothing is deleted. Errors propagate so the
/// scheduler sees a failed run.
pub fn handle_retention_sweep(
    now: DateTime<Utc>,
    store: &dyn DocumentStore,
) -> Result<SweepOutcome, SweepError> {
    let cutoff = retention_cutoff(now);
    let stale = store
        .run_query(&stale_chats_query(cutoff))
        .map_err(SweepError::Query)?;

    if stale.is_empty() {
        tracing::info!(component = COMPONENT, cutoff = %cutoff, "no old anonymous chats to delete");
        return Ok(SweepOutcome {
            cutoff,
            deleted_count: 0,
        });
    }

    let names: Vec<String> = stale.into_iter().map(|document| document.name).collect();
    let deleted_count = store
        .delete_batch(&names)
        .map_err(|source| SweepError::Commit {
            count: names.len(),
            source,
        })?;

    tracing::info!(
        component = COMPONENT,
        cutoff = %cutoff,
        deleted_count,
        "deleted old anonymous chats"
    );
    Ok(SweepOutcome {
        cutoff,
        deleted_count,
    })
}
