//! Long-running remote operation types

use serde::{Deserialize, Serialize};

/// Identifier of a remote long-running operation.
///
/// The API returns full names like `projects/p/locations/l/operations/123`;
/// only the trailing segment is stored and polled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extract the trailing id segment from a full operation name.
    #[must_use]
    pub fn from_operation_name(name: &str) -> Self {
        Self(name.rsplit('/').next().unwrap_or(name).to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self(String::new())
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal result of a polled operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OperationTerminal {
    /// Operation finished without a top-level error
    Succeeded,
    /// Operation finished carrying an error and per-item partial failures
    Failed {
        message: String,
        partial_failures: Vec<String>,
    },
}

impl OperationTerminal {
    /// Collate the top-level message with all partial failures,
    /// newline-joined, for display and persistence.
    #[must_use]
    pub fn collated_error(&self) -> Option<String> {
        match self {
            Self::Succeeded => None,
            Self::Failed {
                message,
                partial_failures,
            } => {
                let mut lines = Vec::with_capacity(1 + partial_failures.len());
                lines.push(message.clone());
                lines.extend(partial_failures.iter().cloned());
                Some(lines.join("\n"))
            }
        }
    }
}

/// One observation of a remote operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OperationOutcome {
    /// Still running; poll again
    Pending,
    /// Reached a terminal state
    Done(OperationTerminal),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_from_operation_name() {
        let id = OperationId::from_operation_name("projects/p/locations/l/operations/op-9");
        assert_eq!(id.as_str(), "op-9");
    }

    #[test]
    fn collated_error_joins_partial_failures() {
        let terminal = OperationTerminal::Failed {
            message: "import failed".into(),
            partial_failures: vec!["row 3: bad uri".into(), "row 9: unreadable".into()],
        };
        assert_eq!(
            terminal.collated_error().unwrap(),
            "import failed\nrow 3: bad uri\nrow 9: unreadable"
        );
    }

    #[test]
    fn success_has_no_collated_error() {
        assert!(OperationTerminal::Succeeded.collated_error().is_none());
    }
}
