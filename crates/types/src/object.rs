//! Remote object naming and representation

use std::collections::HashMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::resource::BucketName;

/// `encodeURIComponent` escape set: everything except
/// `A-Za-z0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Manifest file name under the dataset prefix
pub const MANIFEST_FILE_NAME: &str = "labels.csv";

/// Fixed storage prefix for all training uploads
const TRAINING_PREFIX: &str = "training";

/// Metadata key carrying the label name
pub const LABEL_METADATA_KEY: &str = "label";

/// Metadata map attached to a stored object
pub type ObjectMetadata = HashMap<String, String>;

/// Derive the deterministic remote name for a file under a dataset's prefix.
///
/// `training/{dataset_id}/{percent-encoded file name}`. Encoding follows
/// `encodeURIComponent`, so re-runs land on the same name for the same
/// attachment.
#[must_use]
pub fn object_name(dataset_id: &str, file_name: &str) -> String {
    let encoded = utf8_percent_encode(file_name, COMPONENT).to_string();
    format!("{TRAINING_PREFIX}/{dataset_id}/{encoded}")
}

/// Prefix under which all of a dataset's objects live
#[must_use]
pub fn dataset_prefix(dataset_id: &str) -> String {
    format!("{TRAINING_PREFIX}/{dataset_id}")
}

/// A stored object as returned by a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Object name (full path within the bucket)
    pub name: String,
    /// Custom metadata, possibly carrying a `label` key
    #[serde(default)]
    pub metadata: ObjectMetadata,
}

impl RemoteObject {
    /// Label carried in the object's metadata, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.metadata.get(LABEL_METADATA_KEY).map(String::as_str)
    }
}

/// `gs://bucket/name` style URI for a stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageUri(String);

impl StorageUri {
    #[must_use]
    pub fn new(bucket: &BucketName, name: &str) -> Self {
        Self(format!("gs://{bucket}/{name}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StorageUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_is_deterministic_and_escaped() {
        let name = object_name("ICN42", "att1.png");
        assert_eq!(name, "training/ICN42/att1.png");

        let escaped = object_name("ICN42", "att 1/odd.png");
        assert_eq!(escaped, "training/ICN42/att%201%2Fodd.png");
        // Same inputs, same name on a re-run.
        assert_eq!(escaped, object_name("ICN42", "att 1/odd.png"));
    }

    #[test]
    fn storage_uri_format() {
        let uri = StorageUri::new(&BucketName::new("training-data"), "training/ICN42/labels.csv");
        assert_eq!(uri.as_str(), "gs://training-data/training/ICN42/labels.csv");
    }

    #[test]
    fn label_metadata_lookup() {
        let mut metadata = ObjectMetadata::new();
        metadata.insert(LABEL_METADATA_KEY.to_string(), "cat".to_string());
        let obj = RemoteObject {
            name: "training/ICN42/a.png".into(),
            metadata,
        };
        assert_eq!(obj.label(), Some("cat"));

        let unlabeled = RemoteObject {
            name: "training/ICN42/b.png".into(),
            metadata: ObjectMetadata::new(),
        };
        assert_eq!(unlabeled.label(), None);
    }
}
