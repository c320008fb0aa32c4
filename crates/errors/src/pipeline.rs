//! Pre-processing pipeline error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum PipelineError {
    #[error("stage {stage} failed: {message}")]
    StageFailed { stage: String, message: String },

    #[error("pipeline halted: step {step} previously failed; restart required")]
    Halted { step: String },

    #[error("import terminated with errors:\n{collated}")]
    ImportTerminal { collated: String },

    #[error("worker task panicked: {message}")]
    WorkerPanic { message: String },
}

impl UserFacingError for PipelineError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Halted { .. } | Self::StageFailed { .. } | Self::ImportTerminal { .. } => {
                Some("Run `datalift restart` to clear pipeline state and start over.")
            }
            Self::WorkerPanic { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::StageFailed { .. } => "pipeline.stage_failed",
            Self::Halted { .. } => "pipeline.halted",
            Self::ImportTerminal { .. } => "pipeline.import_terminal",
            Self::WorkerPanic { .. } => "pipeline.worker_panic",
        };
        Some(code)
    }
}
