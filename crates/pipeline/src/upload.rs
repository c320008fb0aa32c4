//! Bounded-concurrency upload stage.
//!
//! Every record of the source table is processed exactly once through a
//! worker pool with an awaited drain barrier. Per-record failures never
//! abort the batch; they surface as warning events and the progress bar
//! keeps ticking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use datalift_errors::{Error, Result};
use datalift_events::{AppEvent, EventEmitter, EventSender, ProgressEvent, UploadEvent};
use datalift_types::{
    object_name, BucketName, DatasetRef, ObjectMetadata, SourceRecord, LABEL_METADATA_KEY,
};

use crate::contract::{ObjectStore, RecordSource};

/// Progress id used for upload-stage progress events
pub const UPLOAD_PROGRESS_ID: &str = "upload";

/// Counts of what the stage did, for reporting only. The stage itself
/// resolves successfully regardless of per-record outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct UploadSummary {
    pub total: u64,
    pub uploaded: u64,
    pub reused: u64,
    pub backfilled: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// What processing one record amounted to
enum RecordOutcome {
    Skipped,
    Reused,
    Backfilled,
    Uploaded,
    Failed,
}

/// Run the upload stage over every record of `table`.
///
/// `concurrency` caps in-flight records; permits are acquired before
/// spawning, so at concurrency 1 the records are processed strictly in
/// submission order.
///
/// # Errors
///
/// Fails only when the record listing itself cannot be fetched; per-record
/// failures are absorbed into the summary.
pub async fn run_upload_stage<R, S>(
    records: &Arc<R>,
    store: &Arc<S>,
    tx: &EventSender,
    dataset: &DatasetRef,
    bucket: &BucketName,
    table: &str,
    concurrency: usize,
) -> Result<UploadSummary>
where
    R: RecordSource + 'static,
    S: ObjectStore + 'static,
{
    let candidates = records.select_records(table).await?;
    let total = candidates.len() as u64;

    tx.emit(AppEvent::Progress(ProgressEvent::started(
        UPLOAD_PROGRESS_ID,
        "upload images",
        Some(total),
    )));

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let completed = Arc::new(AtomicU64::new(0));
    let mut tasks: JoinSet<RecordOutcome> = JoinSet::new();

    for record in candidates {
        // Acquiring before spawning both bounds the pool and keeps
        // submission order when the pool is size 1.
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| Error::internal(format!("upload pool closed: {e}")))?;

        let records = Arc::clone(records);
        let store = Arc::clone(store);
        let tx = tx.clone();
        let dataset_id = dataset.dataset_id().to_string();
        let bucket = bucket.clone();
        let completed = Arc::clone(&completed);

        tasks.spawn(async move {
            let _permit = permit;
            let outcome = process_record(&*records, &*store, &tx, &dataset_id, &bucket, &record)
                .await
                .unwrap_or_else(|error| {
                    tx.emit(AppEvent::Upload(UploadEvent::RecordFailed {
                        record_id: record.id.clone(),
                        error: error.to_string(),
                    }));
                    RecordOutcome::Failed
                });

            // Failed and skipped records still advance the visible bar.
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            tx.emit_progress_counted(UPLOAD_PROGRESS_ID, done, total);
            outcome
        });
    }

    // Drain barrier: the stage resolves only once every task has settled.
    let mut summary = UploadSummary {
        total,
        ..UploadSummary::default()
    };
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(RecordOutcome::Skipped) => summary.skipped += 1,
            Ok(RecordOutcome::Reused) => summary.reused += 1,
            Ok(RecordOutcome::Backfilled) => summary.backfilled += 1,
            Ok(RecordOutcome::Uploaded) => summary.uploaded += 1,
            Ok(RecordOutcome::Failed) => summary.failed += 1,
            Err(join_error) => {
                tx.emit_warning(format!("upload worker aborted: {join_error}"));
                summary.failed += 1;
            }
        }
    }

    tx.emit(AppEvent::Progress(ProgressEvent::completed(
        UPLOAD_PROGRESS_ID,
    )));

    Ok(summary)
}

async fn process_record<R, S>(
    records: &R,
    store: &S,
    tx: &EventSender,
    dataset_id: &str,
    bucket: &BucketName,
    record: &SourceRecord,
) -> Result<RecordOutcome>
where
    R: RecordSource + ?Sized,
    S: ObjectStore + ?Sized,
{
    let (Some(attachment), Some(label)) = (record.primary_attachment(), record.label.as_deref())
    else {
        tx.emit(AppEvent::Upload(UploadEvent::RecordSkipped {
            record_id: record.id.clone(),
        }));
        return Ok(RecordOutcome::Skipped);
    };
    if label.is_empty() {
        tx.emit(AppEvent::Upload(UploadEvent::RecordSkipped {
            record_id: record.id.clone(),
        }));
        return Ok(RecordOutcome::Skipped);
    }

    let file_name = format!("{}.{}", attachment.id, attachment.extension());
    let name = object_name(dataset_id, &file_name);

    match store.stat(bucket, &name).await? {
        Some(metadata) if metadata.contains_key(LABEL_METADATA_KEY) => {
            // Prior run finished this record; nothing to redo.
            tx.emit(AppEvent::Upload(UploadEvent::ObjectReused {
                record_id: record.id.clone(),
                object: name,
            }));
            Ok(RecordOutcome::Reused)
        }
        Some(_) => {
            // Object landed but a crash lost the label patch; re-label only.
            store
                .patch_metadata(bucket, &name, label_metadata(label))
                .await?;
            tx.emit(AppEvent::Upload(UploadEvent::LabelBackfilled {
                record_id: record.id.clone(),
                object: name,
            }));
            Ok(RecordOutcome::Backfilled)
        }
        None => {
            let bytes = records.fetch_attachment(&attachment.url).await?;
            let size = bytes.len() as u64;
            store
                .upload(bucket, &name, &attachment.media_type, bytes)
                .await?;
            store
                .patch_metadata(bucket, &name, label_metadata(label))
                .await?;
            tx.emit(AppEvent::Upload(UploadEvent::ObjectUploaded {
                record_id: record.id.clone(),
                object: name,
                bytes: size,
                label: label.to_string(),
            }));
            Ok(RecordOutcome::Uploaded)
        }
    }
}

fn label_metadata(label: &str) -> ObjectMetadata {
    let mut metadata = ObjectMetadata::new();
    metadata.insert(LABEL_METADATA_KEY.to_string(), label.to_string());
    metadata
}
