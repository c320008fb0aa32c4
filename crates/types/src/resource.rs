//! Cloud resource references

use serde::{Deserialize, Serialize};

/// Cloud project identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Object storage bucket name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketName(String);

impl BucketName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BucketName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BucketName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Reference to a managed dataset.
///
/// The remote API hands back full machine names like
/// `projects/my-project/locations/us-central1/datasets/ICN123`; most calls
/// only want the trailing dataset id, so both forms are accessible here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetRef(String);

impl DatasetRef {
    #[must_use]
    pub fn new(machine_name: impl Into<String>) -> Self {
        Self(machine_name.into())
    }

    /// Full machine name as returned by the API.
    #[must_use]
    pub fn machine_name(&self) -> &str {
        &self.0
    }

    /// Trailing id segment (`ICN123` from `projects/.../datasets/ICN123`).
    /// A bare id is returned unchanged.
    #[must_use]
    pub fn dataset_id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dataset_id())
    }
}

impl From<&str> for DatasetRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_id_from_machine_name() {
        let d = DatasetRef::new("projects/p1/locations/us-central1/datasets/ICN42");
        assert_eq!(d.dataset_id(), "ICN42");
    }

    #[test]
    fn dataset_id_from_bare_id() {
        let d = DatasetRef::new("ICN42");
        assert_eq!(d.dataset_id(), "ICN42");
    }
}
