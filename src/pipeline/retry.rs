//! Retry pass. Re-queues failed records for the next pipeline run, up to a
//! configured bound.

use tracing::{debug, error, info};

use crate::error::Result;
use crate::record::Status;
use crate::schema;
use crate::store::RecordStore;

/// Re-queue every `Failed` record whose next attempt is still within the
/// retry bound.
///
/// Re-queueing resets the status to pending, persists the incremented
/// attempt counter, and leaves a remark. Records at the bound are left
/// untouched; `Invalid` records are never retried. Returns how many records
/// were re-queued.
pub async fn retry_failed(store: &dyn RecordStore, max_retries: u32) -> Result<usize> {
    let records = store.fetch_all().await?;

    let mut requeued = 0;
    for record in records {
        if record.status != Status::Failed {
            continue;
        }

        let attempt = record.retry_count + 1;
        if attempt >= max_retries {
            debug!(
                email = %record.contact_email,
                attempts = attempt,
                "Retry bound reached; leaving record failed"
            );
            continue;
        }

        let fields = [
            (schema::STATUS, Status::Pending.as_str().to_string()),
            (schema::RETRY_COUNT, attempt.to_string()),
            (
                schema::REMARKS,
                format!("Retrying after failure. Attempt {attempt}/{max_retries}"),
            ),
        ];
        // A write failure skips this record; the pass keeps going.
        match store.update_fields(&record.contact_email, &fields).await {
            Ok(()) => {
                info!(
                    email = %record.contact_email,
                    attempt,
                    max_retries,
                    "Re-queued failed record"
                );
                requeued += 1;
            }
            Err(e) => {
                error!(
                    email = %record.contact_email,
                    error = %e,
                    "Failed to re-queue record"
                );
            }
        }
    }

    Ok(requeued)
}
