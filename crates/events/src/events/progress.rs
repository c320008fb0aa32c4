use serde::{Deserialize, Serialize};

/// Progress reporting for long-running operations.
///
/// The fraction is the wizard's progress-bar position in `[0.0, 1.0]`;
/// `current`/`total` carry the per-item count when one exists (upload stage).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    Started {
        id: String,
        operation: String,
        total: Option<u64>,
    },
    Updated {
        id: String,
        fraction: f64,
        current: Option<u64>,
        total: Option<u64>,
    },
    Completed {
        id: String,
    },
    Failed {
        id: String,
        error: String,
    },
}

impl ProgressEvent {
    pub fn started(id: impl Into<String>, operation: impl Into<String>, total: Option<u64>) -> Self {
        Self::Started {
            id: id.into(),
            operation: operation.into(),
            total,
        }
    }

    #[must_use]
    pub fn fraction(id: impl Into<String>, fraction: f64) -> Self {
        Self::Updated {
            id: id.into(),
            fraction,
            current: None,
            total: None,
        }
    }

    #[must_use]
    pub fn counted(id: impl Into<String>, current: u64, total: u64) -> Self {
        let fraction = if total == 0 {
            1.0
        } else {
            current as f64 / total as f64
        };
        Self::Updated {
            id: id.into(),
            fraction,
            current: Some(current),
            total: Some(total),
        }
    }

    pub fn completed(id: impl Into<String>) -> Self {
        Self::Completed { id: id.into() }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failed {
            id: id.into(),
            error: error.into(),
        }
    }
}
