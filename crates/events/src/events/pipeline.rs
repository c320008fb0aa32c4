use serde::{Deserialize, Serialize};

/// Sequencer lifecycle events for the pre-processing pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// A stage began executing
    StageStarted { stage: u8, label: String },

    /// A stage finished successfully; the sequencer advances
    StageCompleted { stage: u8, label: String },

    /// A stage failed; the sequencer halts until an explicit restart
    StageFailed {
        stage: u8,
        label: String,
        error: String,
    },

    /// All three stages completed
    PipelineCompleted,

    /// Persisted state was cleared by an explicit restart
    PipelineRestarted,
}
