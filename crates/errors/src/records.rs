//! Record-store error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum RecordsError {
    #[error("table not found: {table}")]
    TableNotFound { table: String },

    #[error("field not found: {field}")]
    FieldNotFound { field: String },

    #[error("record listing failed: {message}")]
    ListFailed { message: String },

    #[error("attachment fetch failed for {url}: {message}")]
    AttachmentFetchFailed { url: String, message: String },

    #[error("unexpected cell value in field {field}: {message}")]
    UnexpectedCellValue { field: String, message: String },
}

impl UserFacingError for RecordsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::TableNotFound { .. } | Self::FieldNotFound { .. } => {
                Some("Check the source table and field names in your datalift configuration.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ListFailed { .. } | Self::AttachmentFetchFailed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::TableNotFound { .. } => "records.table_not_found",
            Self::FieldNotFound { .. } => "records.field_not_found",
            Self::ListFailed { .. } => "records.list_failed",
            Self::AttachmentFetchFailed { .. } => "records.attachment_fetch_failed",
            Self::UnexpectedCellValue { .. } => "records.unexpected_cell_value",
        };
        Some(code)
    }
}
