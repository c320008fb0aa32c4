//! Managed-ML (AutoML) API error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum AutomlError {
    #[error("dataset not found: {dataset}")]
    DatasetNotFound { dataset: String },

    #[error("import already running for dataset {dataset}")]
    ImportAlreadyRunning { dataset: String },

    #[error("no running import operation found for dataset {dataset}")]
    NoRunningImport { dataset: String },

    #[error("operation not found: {operation}")]
    OperationNotFound { operation: String },

    #[error("operation {operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("import trigger failed: {message}")]
    ImportFailed { message: String },

    #[error("model training trigger failed: {message}")]
    TrainingFailed { message: String },

    #[error("malformed operation name: {name}")]
    MalformedOperationName { name: String },
}

impl UserFacingError for AutomlError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::DatasetNotFound { .. } => {
                Some("Verify the dataset name in your datalift configuration.")
            }
            Self::OperationFailed { .. } => {
                Some("Inspect the collated failure messages, then restart pre-processing.")
            }
            Self::NoRunningImport { .. } => {
                Some("Restart pre-processing to trigger a fresh import.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::ImportFailed { .. } | Self::TrainingFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::DatasetNotFound { .. } => "automl.dataset_not_found",
            Self::ImportAlreadyRunning { .. } => "automl.import_already_running",
            Self::NoRunningImport { .. } => "automl.no_running_import",
            Self::OperationNotFound { .. } => "automl.operation_not_found",
            Self::OperationFailed { .. } => "automl.operation_failed",
            Self::ImportFailed { .. } => "automl.import_failed",
            Self::TrainingFailed { .. } => "automl.training_failed",
            Self::MalformedOperationName { .. } => "automl.malformed_operation_name",
        };
        Some(code)
    }
}
