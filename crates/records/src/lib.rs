#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Record-store access for datalift
//!
//! Implements the pipeline's `RecordSource` contract over the record
//! store's REST API, plus an in-memory double for tests.

mod http;
mod memory;

pub use http::{FieldSelection, HttpRecordSource};
pub use memory::MemoryRecordSource;
