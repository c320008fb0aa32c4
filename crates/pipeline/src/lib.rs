#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! The datalift pre-processing pipeline
//!
//! Three resumable stages - upload, manifest, import - driven by a
//! sequencer whose every transition is a pure reduction persisted with a
//! compare-and-swap. All remote effects go through the contracts in
//! [`contract`]; this crate contains no HTTP or database code.

pub mod contract;
pub mod import;
pub mod manifest;
pub mod sequencer;
pub mod upload;

pub use contract::{DatasetService, ImportStart, ObjectStore, RecordSource, StateStore};
pub use import::{poll_import, resolve_import_operation};
pub use manifest::{manifest_uri, render_manifest, run_manifest_stage, ManifestOutcome};
pub use sequencer::{reduce, Sequencer, SequencerConfig, StageEvent};
pub use upload::{run_upload_stage, UploadSummary, UPLOAD_PROGRESS_ID};
