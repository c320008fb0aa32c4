//! In-memory record source for tests and dry runs

use std::collections::HashMap;

use async_trait::async_trait;

use datalift_errors::{RecordsError, Result};
use datalift_pipeline::RecordSource;
use datalift_types::SourceRecord;

/// A canned record source backed by memory
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    records: Vec<SourceRecord>,
    attachments: HashMap<String, Vec<u8>>,
}

impl MemoryRecordSource {
    #[must_use]
    pub fn new(records: Vec<SourceRecord>) -> Self {
        Self {
            records,
            attachments: HashMap::new(),
        }
    }

    /// Register the bytes served for an attachment URL.
    #[must_use]
    pub fn with_attachment(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.attachments.insert(url.into(), bytes);
        self
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn select_records(&self, _table: &str) -> Result<Vec<SourceRecord>> {
        Ok(self.records.clone())
    }

    async fn fetch_attachment(&self, url: &str) -> Result<Vec<u8>> {
        self.attachments.get(url).cloned().ok_or_else(|| {
            RecordsError::AttachmentFetchFailed {
                url: url.to_string(),
                message: "no bytes registered".to_string(),
            }
            .into()
        })
    }
}
