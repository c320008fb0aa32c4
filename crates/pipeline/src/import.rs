//! Import-and-poll stage.
//!
//! Split in two so the sequencer can persist the operation id the moment it
//! is known: `resolve_import_operation` reuses or triggers, and
//! `poll_import` drives the operation to terminal state.

use std::time::Duration;

use datalift_errors::{PipelineError, Result};
use datalift_events::{AppEvent, EventEmitter, EventSender, ImportEvent};
use datalift_types::{
    DatasetRef, OperationId, OperationOutcome, OperationTerminal, ProjectId, StorageUri,
};

use crate::contract::{DatasetService, ImportStart};

/// Reuse a previously captured operation id, or trigger a new import.
///
/// The "already running" trigger failure is tolerated: with no stored id the
/// running operation is looked up instead of blindly re-triggering, which
/// keeps the retry path off the remote API's duplicate-trigger tolerance.
///
/// # Errors
///
/// Fails when the trigger fails for any other reason, or when "already
/// running" is reported but no running operation can be found.
pub async fn resolve_import_operation<D>(
    service: &D,
    tx: &EventSender,
    project: &ProjectId,
    dataset: &DatasetRef,
    manifest_uri: &StorageUri,
    stored: &OperationId,
) -> Result<OperationId>
where
    D: DatasetService + ?Sized,
{
    if !stored.is_empty() {
        // A prior run already captured the operation; never reissue the
        // trigger in that case.
        tx.emit(AppEvent::Import(ImportEvent::OperationReused {
            operation_id: stored.to_string(),
        }));
        return Ok(stored.clone());
    }

    match service.import_data(project, dataset, manifest_uri).await? {
        ImportStart::Started(operation) => {
            tx.emit(AppEvent::Import(ImportEvent::Triggered {
                operation_id: operation.to_string(),
            }));
            Ok(operation)
        }
        ImportStart::AlreadyRunning => {
            let running = service.find_running_import(project, dataset).await?;
            tx.emit(AppEvent::Import(ImportEvent::AlreadyRunning {
                operation_id: running.as_ref().map(ToString::to_string),
            }));
            running.ok_or_else(|| {
                datalift_errors::AutomlError::NoRunningImport {
                    dataset: dataset.dataset_id().to_string(),
                }
                .into()
            })
        }
    }
}

/// Poll the operation until it reaches a terminal state.
///
/// No caller-side timeout is applied; the loop runs until the remote
/// signals terminal.
///
/// # Errors
///
/// A terminal error collates the top-level message with every partial
/// failure (newline-joined) into `PipelineError::ImportTerminal` - treated
/// as a stage failure, not an informational message.
pub async fn poll_import<D>(
    service: &D,
    tx: &EventSender,
    project: &ProjectId,
    operation: &OperationId,
    poll_interval: Duration,
) -> Result<()>
where
    D: DatasetService + ?Sized,
{
    loop {
        match service.poll_operation(project, operation).await? {
            OperationOutcome::Pending => {
                tx.emit(AppEvent::Import(ImportEvent::Polled {
                    operation_id: operation.to_string(),
                }));
                tokio::time::sleep(poll_interval).await;
            }
            OperationOutcome::Done(terminal) => {
                let (success, partial_failures) = match &terminal {
                    OperationTerminal::Succeeded => (true, 0),
                    OperationTerminal::Failed {
                        partial_failures, ..
                    } => (false, partial_failures.len()),
                };
                tx.emit(AppEvent::Import(ImportEvent::Terminal {
                    operation_id: operation.to_string(),
                    success,
                    partial_failures,
                }));

                return match terminal.collated_error() {
                    None => Ok(()),
                    Some(collated) => Err(PipelineError::ImportTerminal { collated }.into()),
                };
            }
        }
    }
}
