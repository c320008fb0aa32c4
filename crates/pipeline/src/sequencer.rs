//! Resumable 3-stage sequencer.
//!
//! Every persisted transition is computed by the pure [`reduce`] function
//! and saved through the [`StateStore`]'s compare-and-swap, so overlapping
//! sequencer ticks cannot clobber each other: the loser's save fails with a
//! conflict and its results are discarded. Re-entrancy falls out of the
//! stages' idempotence - existence checks in stages 1 and 2, the reused
//! operation id in stage 3.

use std::sync::Arc;
use std::time::Duration;

use datalift_errors::Result;
use datalift_events::{AppEvent, EventEmitter, EventSender, PipelineEvent};
use datalift_types::{
    BucketName, DatasetRef, OperationId, PipelineSnapshot, ProjectId, Stage, StepOutcome,
};

use crate::contract::{DatasetService, ObjectStore, RecordSource, StateStore};
use crate::import::{poll_import, resolve_import_operation};
use crate::manifest::{manifest_uri, run_manifest_stage};
use crate::upload::run_upload_stage;

/// Everything the sequencer needs to know about the run
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    pub project: ProjectId,
    pub bucket: BucketName,
    pub dataset: DatasetRef,
    pub table: String,
    pub upload_concurrency: usize,
    pub poll_interval: Duration,
}

/// Transitions applied to the persisted snapshot
#[derive(Debug, Clone)]
pub enum StageEvent {
    /// A stage begins: persist its number, reset progress, set the label
    Entered(Stage),
    /// The import operation id became known
    OperationCaptured(OperationId),
    /// A coarse progress milestone worth persisting
    Progress(f64),
    /// The stage's work finished; append the success outcome and advance
    Succeeded(Stage),
    /// The stage's work failed; append the failure outcome and halt
    Failed(Stage, String),
}

/// Pure reducer: `(snapshot, event) -> snapshot`.
///
/// Contains every transition rule of the state machine; persistence and
/// effects live elsewhere.
#[must_use]
pub fn reduce(mut snapshot: PipelineSnapshot, event: &StageEvent) -> PipelineSnapshot {
    match event {
        StageEvent::Entered(stage) => {
            snapshot.stage = Some(*stage);
            snapshot.progress = 0.0;
            snapshot.current_step = stage.step_label();
        }
        StageEvent::OperationCaptured(operation) => {
            snapshot.operation_id = operation.clone();
        }
        StageEvent::Progress(fraction) => {
            snapshot.progress = *fraction;
        }
        StageEvent::Succeeded(stage) => {
            snapshot
                .completed_steps
                .push(StepOutcome::success(stage.step_name()));
            snapshot.stage = stage.next();
            // Progress resets for the next stage; after the final one the
            // 1.0 reading is kept for display.
            if snapshot.stage.is_some() {
                snapshot.progress = 0.0;
            }
        }
        StageEvent::Failed(stage, message) => {
            snapshot
                .completed_steps
                .push(StepOutcome::failure(stage.step_name(), message.clone()));
            snapshot.error_message = message.clone();
            // The stage pointer does not advance; only restart clears it.
        }
    }
    snapshot
}

/// Drives the pipeline from whatever state is persisted to a terminal one.
pub struct Sequencer<R, S, D, St> {
    records: Arc<R>,
    store: Arc<S>,
    datasets: Arc<D>,
    state: Arc<St>,
    config: SequencerConfig,
    tx: EventSender,
}

impl<R, S, D, St> Sequencer<R, S, D, St>
where
    R: RecordSource + 'static,
    S: ObjectStore + 'static,
    D: DatasetService,
    St: StateStore,
{
    pub fn new(
        records: Arc<R>,
        store: Arc<S>,
        datasets: Arc<D>,
        state: Arc<St>,
        config: SequencerConfig,
        tx: EventSender,
    ) -> Self {
        Self {
            records,
            store,
            datasets,
            state,
            config,
            tx,
        }
    }

    /// Run stages until the pipeline is done or halts on a failure.
    ///
    /// Re-entrant: resumes from the persisted snapshot, initializing it on
    /// first entry.
    ///
    /// # Errors
    ///
    /// Fails on persistence errors (including version conflicts from a
    /// concurrent tick). Stage failures do NOT surface here - they are
    /// recorded in the returned snapshot's step log.
    pub async fn run(&self) -> Result<PipelineSnapshot> {
        let mut snapshot = self.state.load().await?;

        // First entry: initialize to stage 1.
        if snapshot.stage.is_none() && snapshot.completed_steps.is_empty() {
            snapshot = self.apply(snapshot, &StageEvent::Entered(Stage::Upload)).await?;
        }

        loop {
            if snapshot.is_failed() {
                let step = snapshot.last_step().map(|s| s.name.clone()).unwrap_or_default();
                self.tx
                    .emit_warning(format!("pipeline halted: step \"{step}\" failed; restart required"));
                return Ok(snapshot);
            }

            let Some(stage) = snapshot.stage else {
                // No active stage and no failure: all steps completed.
                self.tx.emit(AppEvent::Pipeline(PipelineEvent::PipelineCompleted));
                return Ok(snapshot);
            };

            self.tx.emit(AppEvent::Pipeline(PipelineEvent::StageStarted {
                stage: stage.number(),
                label: stage.step_label(),
            }));

            let result = self.run_stage(stage, &mut snapshot).await;

            match result {
                Ok(()) => {
                    snapshot = self.apply(snapshot, &StageEvent::Succeeded(stage)).await?;
                    self.tx.emit(AppEvent::Pipeline(PipelineEvent::StageCompleted {
                        stage: stage.number(),
                        label: stage.step_label(),
                    }));
                    if let Some(next) = stage.next() {
                        snapshot = self.apply(snapshot, &StageEvent::Entered(next)).await?;
                    }
                }
                Err(error) => {
                    let message = error.to_string();
                    snapshot = self
                        .apply(snapshot, &StageEvent::Failed(stage, message.clone()))
                        .await?;
                    self.tx.emit(AppEvent::Pipeline(PipelineEvent::StageFailed {
                        stage: stage.number(),
                        label: stage.step_label(),
                        error: message,
                    }));
                    return Ok(snapshot);
                }
            }
        }
    }

    /// Clear all persisted state - the only exit from a failed pipeline.
    ///
    /// # Errors
    ///
    /// Fails when the underlying store cannot be cleared.
    pub async fn restart(&self) -> Result<()> {
        self.state.clear().await?;
        self.tx
            .emit(AppEvent::Pipeline(PipelineEvent::PipelineRestarted));
        Ok(())
    }

    async fn run_stage(&self, stage: Stage, snapshot: &mut PipelineSnapshot) -> Result<()> {
        match stage {
            Stage::Upload => {
                run_upload_stage(
                    &self.records,
                    &self.store,
                    &self.tx,
                    &self.config.dataset,
                    &self.config.bucket,
                    &self.config.table,
                    self.config.upload_concurrency,
                )
                .await?;
                Ok(())
            }
            Stage::Manifest => {
                run_manifest_stage(
                    &*self.store,
                    &self.tx,
                    &self.config.dataset,
                    &self.config.bucket,
                )
                .await?;
                Ok(())
            }
            Stage::Import => {
                let uri = manifest_uri(&self.config.bucket, &self.config.dataset);
                let operation = resolve_import_operation(
                    &*self.datasets,
                    &self.tx,
                    &self.config.project,
                    &self.config.dataset,
                    &uri,
                    &snapshot.operation_id,
                )
                .await?;

                // Persist the id before polling so a crash mid-poll resumes
                // against the same operation instead of re-triggering.
                if operation != snapshot.operation_id {
                    *snapshot = self
                        .apply(
                            snapshot.clone(),
                            &StageEvent::OperationCaptured(operation.clone()),
                        )
                        .await?;
                }
                *snapshot = self.apply(snapshot.clone(), &StageEvent::Progress(0.66)).await?;

                poll_import(
                    &*self.datasets,
                    &self.tx,
                    &self.config.project,
                    &operation,
                    self.config.poll_interval,
                )
                .await?;

                *snapshot = self.apply(snapshot.clone(), &StageEvent::Progress(1.0)).await?;
                Ok(())
            }
        }
    }

    async fn apply(
        &self,
        snapshot: PipelineSnapshot,
        event: &StageEvent,
    ) -> Result<PipelineSnapshot> {
        let next = reduce(snapshot, event);
        self.state.save(&next).await
    }
}
