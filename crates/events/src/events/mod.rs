use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventSource};
use datalift_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Optional stable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self {
            code: error.user_code().map(str::to_string),
            message: error.user_message().into_owned(),
            hint: error.user_hint().map(str::to_string),
            retryable: error.is_retryable(),
        }
    }
}

// Declare all domain modules
pub mod general;
pub mod import;
pub mod pipeline;
pub mod progress;
pub mod upload;

// Re-export all domain events
pub use general::*;
pub use import::*;
pub use pipeline::*;
pub use progress::*;
pub use upload::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Progress-bar updates for the active step
    Progress(ProgressEvent),

    /// Per-record upload stage events
    Upload(UploadEvent),

    /// Sequencer lifecycle events
    Pipeline(PipelineEvent),

    /// Import-and-poll stage events
    Import(ImportEvent),

    /// Model-training events
    Training(TrainingEvent),
}

impl AppEvent {
    /// Default source used for event metadata.
    #[must_use]
    pub fn source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Progress(_) => EventSource::PROGRESS,
            Self::Upload(_) => EventSource::UPLOAD,
            Self::Pipeline(_) => EventSource::PIPELINE,
            Self::Import(_) => EventSource::IMPORT,
            Self::Training(_) => EventSource::TRAINING,
        }
    }

    /// Default severity used for event metadata.
    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            Self::General(GeneralEvent::Warning { .. }) => EventLevel::Warn,
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. }) => {
                EventLevel::Error
            }
            Self::General(GeneralEvent::DebugLog { .. }) => EventLevel::Debug,
            Self::Upload(UploadEvent::RecordFailed { .. }) => EventLevel::Warn,
            Self::Pipeline(PipelineEvent::StageFailed { .. }) => EventLevel::Error,
            Self::Import(ImportEvent::Polled { .. }) => EventLevel::Debug,
            _ => EventLevel::Info,
        }
    }
}
