//! Persisted-state error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum StateError {
    #[error("invalid stage transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("state conflict: snapshot version {expected} is stale")]
    Conflict { expected: i64 },

    #[error("database error: {message}")]
    DatabaseError { message: String },

    #[error("state corrupted: {message}")]
    StateCorrupted { message: String },

    #[error("migration failed: {message}")]
    MigrationFailed { message: String },
}

impl UserFacingError for StateError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Conflict { .. } => {
                Some("Another datalift run updated the pipeline state; re-run to resume.")
            }
            Self::StateCorrupted { .. } => Some("Run `datalift restart` to clear pipeline state."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::DatabaseError { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidTransition { .. } => "state.invalid_transition",
            Self::Conflict { .. } => "state.conflict",
            Self::DatabaseError { .. } => "state.database_error",
            Self::StateCorrupted { .. } => "state.corrupted",
            Self::MigrationFailed { .. } => "state.migration_failed",
        };
        Some(code)
    }
}
