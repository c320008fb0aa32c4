//! Object-storage error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum StorageError {
    #[error("bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    #[error("object not found: {bucket}/{object}")]
    ObjectNotFound { bucket: String, object: String },

    #[error("upload failed for {object}: {message}")]
    UploadFailed { object: String, message: String },

    #[error("metadata patch failed for {object}: {message}")]
    MetadataPatchFailed { object: String, message: String },

    #[error("listing failed under {prefix}: {message}")]
    ListFailed { prefix: String, message: String },

    #[error("access denied to bucket {bucket}")]
    AccessDenied { bucket: String },

    #[error("invalid object name: {name}")]
    InvalidObjectName { name: String },
}

impl UserFacingError for StorageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::BucketNotFound { .. } => {
                Some("Verify the bucket name in your datalift configuration.")
            }
            Self::AccessDenied { .. } => {
                Some("Ensure the access token grants storage permissions on the bucket.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UploadFailed { .. } | Self::MetadataPatchFailed { .. } | Self::ListFailed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::BucketNotFound { .. } => "storage.bucket_not_found",
            Self::ObjectNotFound { .. } => "storage.object_not_found",
            Self::UploadFailed { .. } => "storage.upload_failed",
            Self::MetadataPatchFailed { .. } => "storage.metadata_patch_failed",
            Self::ListFailed { .. } => "storage.list_failed",
            Self::AccessDenied { .. } => "storage.access_denied",
            Self::InvalidObjectName { .. } => "storage.invalid_object_name",
        };
        Some(code)
    }
}
