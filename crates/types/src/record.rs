//! Record-store cell types

use serde::{Deserialize, Serialize};

/// One attachment from a record's image cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Stable attachment id assigned by the record store
    pub id: String,
    /// Declared media type, e.g. `image/png`
    #[serde(rename = "type")]
    pub media_type: String,
    /// Fetchable URL for the attachment bytes
    pub url: String,
}

impl Attachment {
    /// File extension derived from the declared media type
    /// (`image/png` -> `png`), mirroring how the remote object name is built.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.media_type
            .rsplit('/')
            .next()
            .unwrap_or(&self.media_type)
    }
}

/// A record pulled from the source table, reduced to the two cells the
/// pipeline reads. Either cell may be absent; such records are skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Record id in the source table
    pub id: String,
    /// Attachments from the image field, in cell order
    pub attachments: Vec<Attachment>,
    /// Label name from the label field
    pub label: Option<String>,
}

impl SourceRecord {
    /// First attachment wins; additional attachments are ignored.
    #[must_use]
    pub fn primary_attachment(&self) -> Option<&Attachment> {
        self.attachments.first()
    }

    /// A record qualifies for upload only when both cells are present.
    #[must_use]
    pub fn qualifies(&self) -> bool {
        !self.attachments.is_empty() && self.label.as_deref().is_some_and(|l| !l.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(id: &str) -> Attachment {
        Attachment {
            id: id.to_string(),
            media_type: "image/jpeg".to_string(),
            url: format!("https://records.example/{id}"),
        }
    }

    #[test]
    fn extension_from_media_type() {
        assert_eq!(attachment("a").extension(), "jpeg");
    }

    #[test]
    fn qualification_requires_both_cells() {
        let full = SourceRecord {
            id: "rec1".into(),
            attachments: vec![attachment("a")],
            label: Some("cat".into()),
        };
        assert!(full.qualifies());

        let no_label = SourceRecord {
            id: "rec2".into(),
            attachments: vec![attachment("b")],
            label: None,
        };
        assert!(!no_label.qualifies());

        let no_image = SourceRecord {
            id: "rec3".into(),
            attachments: vec![],
            label: Some("dog".into()),
        };
        assert!(!no_image.qualifies());
    }

    #[test]
    fn first_attachment_wins() {
        let record = SourceRecord {
            id: "rec4".into(),
            attachments: vec![attachment("first"), attachment("second")],
            label: Some("cat".into()),
        };
        assert_eq!(record.primary_attachment().unwrap().id, "first");
    }
}
