//! Persisted pre-processing pipeline snapshot

use serde::{Deserialize, Serialize};

use crate::operation::OperationId;

/// The three ordered pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Upload,
    Manifest,
    Import,
}

impl Stage {
    /// Stage number used for display and persistence (1-based).
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Upload => 1,
            Self::Manifest => 2,
            Self::Import => 3,
        }
    }

    #[must_use]
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Upload),
            2 => Some(Self::Manifest),
            3 => Some(Self::Import),
            _ => None,
        }
    }

    /// Next stage in order, `None` after the last one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// Human-readable step name shown in progress output.
    #[must_use]
    pub fn step_name(self) -> &'static str {
        match self {
            Self::Upload => "Uploading images to cloud storage",
            Self::Manifest => "Creating and uploading the label manifest",
            Self::Import => "Importing data into the dataset",
        }
    }

    /// `1 / 3 - Uploading images to cloud storage` style label.
    #[must_use]
    pub fn step_label(self) -> String {
        format!("{} / 3 - {}", self.number(), self.step_name())
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.step_name())
    }
}

/// Outcome of one completed (or failed) stage, appended to the step log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Step name, matching the stage's label
    pub name: String,
    /// `true` on success, `false` on failure
    pub status: bool,
    /// Failure detail when `status` is `false`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepOutcome {
    #[must_use]
    pub fn success(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: false,
            error: Some(error.into()),
        }
    }
}

/// Immutable snapshot of the persisted pipeline state.
///
/// Survives process restarts; every sequencer transition produces a new
/// snapshot which is saved with a compare-and-swap on `version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    /// Current stage; `None` means the pipeline has not started
    pub stage: Option<Stage>,
    /// In-flight import operation id, empty when none
    #[serde(default)]
    pub operation_id: OperationId,
    /// Append-only log of stage outcomes, at most one per stage
    #[serde(default)]
    pub completed_steps: Vec<StepOutcome>,
    /// Current stage's fractional completion in `[0.0, 1.0]`
    #[serde(default)]
    pub progress: f64,
    /// Human-readable label for the active step
    #[serde(default)]
    pub current_step: String,
    /// Last recorded failure detail
    #[serde(default)]
    pub error_message: String,
    /// Monotonic version stamp; saves compare-and-swap on this
    #[serde(default)]
    pub version: i64,
}

impl Default for PipelineSnapshot {
    fn default() -> Self {
        Self {
            stage: None,
            operation_id: OperationId::default(),
            completed_steps: Vec::new(),
            progress: 0.0,
            current_step: String::new(),
            error_message: String::new(),
            version: 0,
        }
    }
}

impl PipelineSnapshot {
    /// Last step outcome, if any.
    #[must_use]
    pub fn last_step(&self) -> Option<&StepOutcome> {
        self.completed_steps.last()
    }

    /// The pipeline halted on a failed step and needs an explicit restart.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.last_step().is_some_and(|step| !step.status)
    }

    /// All three stages completed successfully.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.completed_steps.len() == 3 && self.completed_steps.iter().all(|step| step.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order() {
        assert_eq!(Stage::Upload.next(), Some(Stage::Manifest));
        assert_eq!(Stage::Manifest.next(), Some(Stage::Import));
        assert_eq!(Stage::Import.next(), None);
    }

    #[test]
    fn step_label_format() {
        assert_eq!(
            Stage::Upload.step_label(),
            "1 / 3 - Uploading images to cloud storage"
        );
    }

    #[test]
    fn failed_detection_uses_last_entry() {
        let mut snapshot = PipelineSnapshot::default();
        assert!(!snapshot.is_failed());

        snapshot
            .completed_steps
            .push(StepOutcome::success(Stage::Upload.step_name()));
        assert!(!snapshot.is_failed());

        snapshot.completed_steps.push(StepOutcome::failure(
            Stage::Manifest.step_name(),
            "listing failed",
        ));
        assert!(snapshot.is_failed());
        assert!(!snapshot.is_done());
    }

    #[test]
    fn done_requires_three_successes() {
        let mut snapshot = PipelineSnapshot::default();
        for stage in [Stage::Upload, Stage::Manifest, Stage::Import] {
            snapshot
                .completed_steps
                .push(StepOutcome::success(stage.step_name()));
        }
        assert!(snapshot.is_done());
    }
}
