#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for datalift
//!
//! This crate provides fundamental types used throughout the system:
//! cloud resource references, record-store cell values, remote objects,
//! long-running operation outcomes, and the persisted pipeline snapshot.

pub mod object;
pub mod operation;
pub mod pipeline;
pub mod record;
pub mod resource;

// Re-export commonly used types
pub use object::{
    dataset_prefix, object_name, ObjectMetadata, RemoteObject, StorageUri, LABEL_METADATA_KEY,
    MANIFEST_FILE_NAME,
};
pub use operation::{OperationId, OperationOutcome, OperationTerminal};
pub use pipeline::{PipelineSnapshot, Stage, StepOutcome};
pub use record::{Attachment, SourceRecord};
pub use resource::{BucketName, DatasetRef, ProjectId};
pub use uuid::Uuid;

use serde::{Deserialize, Serialize};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    Tty,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Tty
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

impl Default for ColorChoice {
    fn default() -> Self {
        Self::Auto
    }
}
