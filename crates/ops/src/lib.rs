#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations orchestration for datalift
//!
//! This crate serves as the orchestration layer between the CLI and
//! specialized crates. Thin CRUD operations are implemented here, while
//! the pipeline and training delegate to the pipeline crate and the
//! cloud clients.

mod context;
mod preprocess;
mod small_ops;
mod training;
mod types;

pub use context::{OpsContextBuilder, OpsCtx};
pub use types::{DatasetSummary, PipelinePhase, PipelineReport, ProjectSummary, TrainingReport};

pub use preprocess::{preprocess, restart, status};
pub use small_ops::{create_dataset, list_buckets, list_datasets, list_projects};
pub use training::train;

use datalift_errors::Error;

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Pipeline run/status report
    Pipeline(PipelineReport),
    /// Training report
    Training(TrainingReport),
    /// Project listing
    Projects(Vec<ProjectSummary>),
    /// Dataset listing
    Datasets(Vec<DatasetSummary>),
    /// Single dataset (after creation)
    Dataset(DatasetSummary),
    /// Bucket listing
    Buckets(Vec<String>),
    /// Generic success message
    Success(String),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            datalift_errors::OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Check if this is a success result
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::Pipeline(report) => report.phase != PipelinePhase::Failed,
            _ => true,
        }
    }
}
