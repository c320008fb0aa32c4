//! Model training trigger - the same start-operation/poll-until-done
//! pattern as the import stage, minus the staging.

use std::time::Duration;

use datalift_errors::{AutomlError, Result};
use datalift_events::{AppEvent, EventEmitter, TrainingEvent};
use datalift_pipeline::DatasetService;
use datalift_types::{DatasetRef, OperationOutcome, ProjectId};

use crate::context::OpsCtx;
use crate::types::TrainingReport;

/// Trigger model training and poll the operation to terminal state.
///
/// A training operation id persisted by an interrupted run is reused
/// instead of triggering a second build.
///
/// # Errors
///
/// Fails when the trigger fails or the operation terminates with an error.
pub async fn train(ctx: &OpsCtx, model_name: &str, train_budget: u64) -> Result<TrainingReport> {
    let project = ProjectId::new(&ctx.config.gcloud.project);
    let dataset = DatasetRef::new(&ctx.config.gcloud.dataset);

    let stored = ctx.state.training_operation().await?;
    let operation = if stored.is_empty() {
        let operation = ctx
            .automl
            .create_model(&project, &dataset, model_name, train_budget)
            .await?;
        ctx.state
            .set_training_operation(&operation, model_name)
            .await?;
        ctx.tx.emit(AppEvent::Training(TrainingEvent::Started {
            model_name: model_name.to_string(),
            operation_id: operation.to_string(),
        }));
        operation
    } else {
        ctx.tx.emit(AppEvent::Training(TrainingEvent::OperationReused {
            operation_id: stored.to_string(),
        }));
        stored
    };

    let poll_interval = Duration::from_secs(ctx.config.pipeline.poll_interval);
    let terminal_error = loop {
        match ctx.automl.poll_operation(&project, &operation).await? {
            OperationOutcome::Pending => tokio::time::sleep(poll_interval).await,
            OperationOutcome::Done(terminal) => break terminal.collated_error(),
        }
    };

    // Terminal either way: the stored id has served its purpose.
    ctx.state.clear_training_operation().await?;
    ctx.tx.emit(AppEvent::Training(TrainingEvent::Terminal {
        operation_id: operation.to_string(),
        success: terminal_error.is_none(),
    }));

    match terminal_error {
        None => Ok(TrainingReport {
            model_name: model_name.to_string(),
            operation_id: operation.to_string(),
        }),
        Some(message) => Err(AutomlError::OperationFailed {
            operation: operation.to_string(),
            message,
        }
        .into()),
    }
}
