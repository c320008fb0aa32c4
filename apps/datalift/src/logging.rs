//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields and
//! initializes the subscriber according to the output mode.

use datalift_events::{
    AppEvent, EventMessage, GeneralEvent, ImportEvent, PipelineEvent, TrainingEvent, UploadEvent,
};
use tracing::{debug, error, info, warn};

/// Initialize tracing/logging
pub fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if json_mode {
        // JSON mode: keep stdout clean for the JSON result
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else if debug_enabled {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,datalift=debug")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }
}

/// Log an event using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    match &message.event {
        AppEvent::Upload(event) => match event {
            UploadEvent::ObjectUploaded {
                record_id,
                object,
                bytes,
                label,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    record_id = %record_id,
                    object = %object,
                    bytes = bytes,
                    label = %label,
                    "Object uploaded"
                );
            }
            UploadEvent::LabelBackfilled { record_id, object } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    record_id = %record_id,
                    object = %object,
                    "Label backfilled"
                );
            }
            UploadEvent::RecordFailed { record_id, error } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    record_id = %record_id,
                    error = %error,
                    "Record processing failed"
                );
            }
            UploadEvent::RecordSkipped { record_id } => {
                debug!(
                    source = meta.source.as_str(),
                    record_id = %record_id,
                    "Record skipped"
                );
            }
            UploadEvent::ObjectReused { record_id, object } => {
                debug!(
                    source = meta.source.as_str(),
                    record_id = %record_id,
                    object = %object,
                    "Object reused"
                );
            }
        },

        AppEvent::Pipeline(event) => match event {
            PipelineEvent::StageStarted { stage, label } => {
                info!(stage = stage, label = %label, "Stage started");
            }
            PipelineEvent::StageCompleted { stage, label } => {
                info!(stage = stage, label = %label, "Stage completed");
            }
            PipelineEvent::StageFailed { stage, label, error } => {
                error!(stage = stage, label = %label, error = %error, "Stage failed");
            }
            PipelineEvent::PipelineCompleted => {
                info!("Pipeline completed");
            }
            PipelineEvent::PipelineRestarted => {
                info!("Pipeline state cleared");
            }
        },

        AppEvent::Import(event) => match event {
            ImportEvent::Triggered { operation_id } => {
                info!(operation_id = %operation_id, "Import triggered");
            }
            ImportEvent::OperationReused { operation_id } => {
                info!(operation_id = %operation_id, "Import operation reused");
            }
            ImportEvent::AlreadyRunning { operation_id } => {
                info!(operation_id = ?operation_id, "Import already running");
            }
            ImportEvent::Polled { operation_id } => {
                debug!(operation_id = %operation_id, "Import operation polled");
            }
            ImportEvent::Terminal {
                operation_id,
                success,
                partial_failures,
            } => {
                if *success {
                    info!(operation_id = %operation_id, "Import finished");
                } else {
                    error!(
                        operation_id = %operation_id,
                        partial_failures = partial_failures,
                        "Import failed"
                    );
                }
            }
        },

        AppEvent::Training(event) => match event {
            TrainingEvent::Started {
                model_name,
                operation_id,
            } => {
                info!(model_name = %model_name, operation_id = %operation_id, "Training started");
            }
            TrainingEvent::OperationReused { operation_id } => {
                info!(operation_id = %operation_id, "Training operation reused");
            }
            TrainingEvent::Terminal {
                operation_id,
                success,
            } => {
                if *success {
                    info!(operation_id = %operation_id, "Training finished");
                } else {
                    error!(operation_id = %operation_id, "Training failed");
                }
            }
        },

        AppEvent::General(event) => match event {
            GeneralEvent::Warning { message, context } => {
                warn!(context = ?context, "{message}");
            }
            GeneralEvent::Error { message, details } => {
                error!(details = ?details, "{message}");
            }
            GeneralEvent::DebugLog { message, .. } => {
                debug!("{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(operation = %operation, success = success, "Operation completed");
            }
            GeneralEvent::OperationFailed { operation, error } => {
                error!(operation = %operation, error = %error, "Operation failed");
            }
        },

        // Progress updates are rendered by the progress bars, not logged.
        AppEvent::Progress(_) => {}
    }
}
