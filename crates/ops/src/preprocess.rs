//! Pre-processing pipeline operations

use std::time::Duration;

use datalift_errors::Result;
use datalift_pipeline::{Sequencer, SequencerConfig, StateStore};
use datalift_types::{BucketName, DatasetRef, ProjectId};

use crate::context::OpsCtx;
use crate::types::PipelineReport;

fn sequencer_config(ctx: &OpsCtx) -> SequencerConfig {
    SequencerConfig {
        project: ProjectId::new(&ctx.config.gcloud.project),
        bucket: BucketName::new(&ctx.config.gcloud.bucket),
        dataset: DatasetRef::new(&ctx.config.gcloud.dataset),
        table: ctx.config.records.table.clone(),
        upload_concurrency: ctx.config.pipeline.upload_concurrency,
        poll_interval: Duration::from_secs(ctx.config.pipeline.poll_interval),
    }
}

fn sequencer(
    ctx: &OpsCtx,
) -> Sequencer<
    datalift_records::HttpRecordSource,
    datalift_gcloud::StorageClient,
    datalift_gcloud::AutomlClient,
    datalift_state::StateManager,
> {
    Sequencer::new(
        ctx.records.clone(),
        ctx.storage.clone(),
        ctx.automl.clone(),
        ctx.state.clone(),
        sequencer_config(ctx),
        ctx.tx.clone(),
    )
}

/// Run the pipeline from its persisted state to a terminal state.
///
/// # Errors
///
/// Fails on configuration or persistence errors; stage failures land in the
/// returned report instead.
pub async fn preprocess(ctx: &OpsCtx) -> Result<PipelineReport> {
    ctx.config.validate_for_pipeline()?;
    let snapshot = sequencer(ctx).run().await?;
    Ok(snapshot.into())
}

/// Show the persisted pipeline state without running anything.
///
/// # Errors
///
/// Fails when the persisted state cannot be read.
pub async fn status(ctx: &OpsCtx) -> Result<PipelineReport> {
    let snapshot = ctx.state.load().await?;
    Ok(snapshot.into())
}

/// Clear all persisted pipeline state (explicit restart).
///
/// # Errors
///
/// Fails when the persisted state cannot be cleared.
pub async fn restart(ctx: &OpsCtx) -> Result<String> {
    sequencer(ctx).restart().await?;
    Ok("Pre-processing state cleared; the next run starts from stage 1".to_string())
}
