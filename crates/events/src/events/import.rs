use serde::{Deserialize, Serialize};

/// Import-and-poll stage events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ImportEvent {
    /// A new import operation was triggered and its id captured
    Triggered { operation_id: String },

    /// A previously persisted operation id is being reused; no new trigger
    OperationReused { operation_id: String },

    /// The trigger reported an import already in progress; polling continues
    AlreadyRunning { operation_id: Option<String> },

    /// One poll observed the operation still pending
    Polled { operation_id: String },

    /// The operation reached a terminal state
    Terminal {
        operation_id: String,
        success: bool,
        partial_failures: usize,
    },
}

/// Model-training trigger/poll events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TrainingEvent {
    /// Training operation triggered
    Started {
        model_name: String,
        operation_id: String,
    },

    /// A previously persisted training operation id is being reused
    OperationReused { operation_id: String },

    /// Training reached a terminal state
    Terminal { operation_id: String, success: bool },
}
