use serde::{Deserialize, Serialize};

/// Per-record events from the upload stage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UploadEvent {
    /// A record is missing its image or label cell and was skipped
    RecordSkipped { record_id: String },

    /// The remote object already exists with a label; nothing to do
    ObjectReused { record_id: String, object: String },

    /// The remote object existed without a label; only the label was patched
    LabelBackfilled { record_id: String, object: String },

    /// Object uploaded and labeled
    ObjectUploaded {
        record_id: String,
        object: String,
        bytes: u64,
        label: String,
    },

    /// Processing one record failed; the batch continues
    RecordFailed { record_id: String, error: String },
}
