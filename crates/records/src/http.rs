//! HTTP record-store client.
//!
//! Speaks the record store's REST listing API and resolves the configured
//! image/label fields into [`SourceRecord`]s. Attachment bytes come from
//! the attachment URLs the store hands out (those carry their own
//! credentials, so no bearer token is attached to them).

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::Value;

use datalift_errors::{RecordsError, Result};
use datalift_net::NetClient;
use datalift_pipeline::RecordSource;
use datalift_types::{Attachment, SourceRecord};

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Field selection for the source table
#[derive(Debug, Clone)]
pub struct FieldSelection {
    pub image_field: String,
    pub label_field: String,
}

/// Record store client over the REST listing API
#[derive(Clone)]
pub struct HttpRecordSource {
    net: NetClient,
    endpoint: String,
    base: String,
    fields: FieldSelection,
}

#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    records: Vec<RawRecord>,
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: String,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

impl HttpRecordSource {
    #[must_use]
    pub fn new(
        net: NetClient,
        endpoint: impl Into<String>,
        base: impl Into<String>,
        fields: FieldSelection,
    ) -> Self {
        Self {
            net,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            base: base.into(),
            fields,
        }
    }

    fn table_url(&self, table: &str, offset: Option<&str>) -> String {
        let table = utf8_percent_encode(table, PATH_SEGMENT);
        let mut url = format!("{}/v0/{}/{}", self.endpoint, self.base, table);
        if let Some(offset) = offset {
            url.push_str("?offset=");
            url.push_str(&utf8_percent_encode(offset, PATH_SEGMENT).to_string());
        }
        url
    }

    fn resolve(&self, raw: RawRecord) -> SourceRecord {
        let attachments = raw
            .fields
            .get(&self.fields.image_field)
            .map(parse_attachments)
            .unwrap_or_default();
        let label = raw.fields.get(&self.fields.label_field).and_then(parse_label);
        SourceRecord {
            id: raw.id,
            attachments,
            label,
        }
    }
}

/// An attachment cell is an array of objects carrying `id`, `url`, `type`.
/// Anything unparseable is treated as an empty cell, which makes the record
/// a skip rather than an error.
fn parse_attachments(value: &Value) -> Vec<Attachment> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<Attachment>(item.clone()).ok())
        .collect()
}

/// A label cell is a single-select object with a `name`, or a bare string.
fn parse_label(value: &Value) -> Option<String> {
    match value {
        Value::String(label) => Some(label.clone()),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn select_records(&self, table: &str) -> Result<Vec<SourceRecord>> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let url = self.table_url(table, offset.as_deref());
            let page: RecordPage = self.net.get_json(&url).await.map_err(|e| {
                datalift_errors::Error::from(RecordsError::ListFailed {
                    message: e.to_string(),
                })
            })?;
            records.extend(page.records.into_iter().map(|raw| self.resolve(raw)));
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }
        Ok(records)
    }

    async fn fetch_attachment(&self, url: &str) -> Result<Vec<u8>> {
        self.net.fetch_bytes(url).await.map_err(|e| {
            RecordsError::AttachmentFetchFailed {
                url: url.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn label_parses_select_and_string_cells() {
        assert_eq!(parse_label(&json!({"name": "cat"})), Some("cat".into()));
        assert_eq!(parse_label(&json!("dog")), Some("dog".into()));
        assert_eq!(parse_label(&json!(42)), None);
    }

    #[test]
    fn malformed_attachment_cells_become_empty() {
        assert!(parse_attachments(&json!("not an array")).is_empty());
        assert!(parse_attachments(&json!([{"no": "url"}])).is_empty());

        let parsed = parse_attachments(&json!([
            {"id": "att1", "type": "image/png", "url": "https://x/att1"},
        ]));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "att1");
    }
}
