//! Operation orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum OpsError {
    #[error("operation failed: {message}")]
    OperationFailed { message: String },

    #[error("invalid operation: {operation}")]
    InvalidOperation { operation: String },

    #[error("context creation failed: {message}")]
    ContextCreationFailed { message: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },

    #[error("event channel closed")]
    EventChannelClosed,
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::OperationFailed { .. } => "ops.operation_failed",
            Self::InvalidOperation { .. } => "ops.invalid_operation",
            Self::ContextCreationFailed { .. } => "ops.context_creation_failed",
            Self::SerializationError { .. } => "ops.serialization_error",
            Self::EventChannelClosed => "ops.event_channel_closed",
        };
        Some(code)
    }
}
