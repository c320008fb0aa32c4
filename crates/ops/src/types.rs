//! Serializable operation reports

use serde::Serialize;

use datalift_types::{PipelineSnapshot, StepOutcome};

/// Terminal state of the pre-processing pipeline as seen by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

/// Report of a preprocess/status invocation
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub phase: PipelinePhase,
    pub current_step: String,
    pub progress: f64,
    pub completed_steps: Vec<StepOutcome>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub operation_id: String,
}

impl From<PipelineSnapshot> for PipelineReport {
    fn from(snapshot: PipelineSnapshot) -> Self {
        let phase = if snapshot.is_failed() {
            PipelinePhase::Failed
        } else if snapshot.is_done() {
            PipelinePhase::Completed
        } else if snapshot.stage.is_some() {
            PipelinePhase::InProgress
        } else {
            PipelinePhase::NotStarted
        };
        Self {
            phase,
            current_step: snapshot.current_step,
            progress: snapshot.progress,
            completed_steps: snapshot.completed_steps,
            error_message: snapshot.error_message,
            operation_id: snapshot.operation_id.to_string(),
        }
    }
}

/// Report of a completed training trigger
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub model_name: String,
    pub operation_id: String,
}

/// One project row for the provisioning listing
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub name: String,
}

/// One dataset row for the provisioning listing
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub display_name: String,
    pub example_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalift_types::Stage;

    #[test]
    fn phase_derivation() {
        let fresh = PipelineSnapshot::default();
        assert_eq!(PipelineReport::from(fresh).phase, PipelinePhase::NotStarted);

        let mut failed = PipelineSnapshot::default();
        failed
            .completed_steps
            .push(StepOutcome::failure(Stage::Upload.step_name(), "boom"));
        assert_eq!(PipelineReport::from(failed).phase, PipelinePhase::Failed);

        let mut done = PipelineSnapshot::default();
        for stage in [Stage::Upload, Stage::Manifest, Stage::Import] {
            done.completed_steps
                .push(StepOutcome::success(stage.step_name()));
        }
        assert_eq!(PipelineReport::from(done).phase, PipelinePhase::Completed);
    }
}
