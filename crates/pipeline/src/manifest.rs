//! Label manifest stage.
//!
//! Lists the dataset's uploaded objects, keeps the labeled ones, and renders
//! the `storage_uri,label` manifest. The manifest is only uploaded when
//! absent: a previously created manifest is left untouched even if labeled
//! objects were added since.

use datalift_errors::Result;
use datalift_events::{AppEvent, EventEmitter, EventSender, ProgressEvent};
use datalift_types::{
    dataset_prefix, object_name, BucketName, DatasetRef, RemoteObject, StorageUri,
    MANIFEST_FILE_NAME,
};

use crate::contract::ObjectStore;

/// Progress id used for manifest-stage progress events
pub const MANIFEST_PROGRESS_ID: &str = "manifest";

/// What the stage did
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum ManifestOutcome {
    /// A manifest with this many entries was rendered and uploaded
    Created { entries: usize },
    /// The manifest already existed; it was not refreshed
    AlreadyPresent,
}

/// Render the manifest document from a listing.
///
/// One `gs://bucket/name,label` line per labeled object, newline-joined, no
/// header, no trailing newline. Neither URIs nor labels are escaped, so a
/// comma in either corrupts the line - a known format limitation.
#[must_use]
pub fn render_manifest(bucket: &BucketName, objects: &[RemoteObject]) -> String {
    objects
        .iter()
        .filter_map(|obj| {
            obj.label()
                .map(|label| format!("{},{label}", StorageUri::new(bucket, &obj.name)))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run the manifest stage.
///
/// # Errors
///
/// Propagates listing/stat/upload failures; the sequencer records them as a
/// visible stage failure rather than crashing.
pub async fn run_manifest_stage<S>(
    store: &S,
    tx: &EventSender,
    dataset: &DatasetRef,
    bucket: &BucketName,
) -> Result<ManifestOutcome>
where
    S: ObjectStore + ?Sized,
{
    let dataset_id = dataset.dataset_id();
    let objects = store.list(bucket, &dataset_prefix(dataset_id)).await?;
    let manifest = render_manifest(bucket, &objects);
    let entries = if manifest.is_empty() {
        0
    } else {
        manifest.lines().count()
    };

    let manifest_name = object_name(dataset_id, MANIFEST_FILE_NAME);
    if store.stat(bucket, &manifest_name).await?.is_some() {
        tx.emit_debug(format!(
            "manifest {manifest_name} already uploaded, keeping it as-is"
        ));
        tx.emit(AppEvent::Progress(ProgressEvent::completed(
            MANIFEST_PROGRESS_ID,
        )));
        return Ok(ManifestOutcome::AlreadyPresent);
    }

    store
        .upload(bucket, &manifest_name, "text/csv", manifest.into_bytes())
        .await?;

    tx.emit(AppEvent::Progress(ProgressEvent::completed(
        MANIFEST_PROGRESS_ID,
    )));

    Ok(ManifestOutcome::Created { entries })
}

/// Storage URI of the dataset's manifest document
#[must_use]
pub fn manifest_uri(bucket: &BucketName, dataset: &DatasetRef) -> StorageUri {
    StorageUri::new(bucket, &object_name(dataset.dataset_id(), MANIFEST_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalift_types::ObjectMetadata;

    fn labeled(name: &str, label: &str) -> RemoteObject {
        let mut metadata = ObjectMetadata::new();
        metadata.insert("label".to_string(), label.to_string());
        RemoteObject {
            name: name.to_string(),
            metadata,
        }
    }

    fn unlabeled(name: &str) -> RemoteObject {
        RemoteObject {
            name: name.to_string(),
            metadata: ObjectMetadata::new(),
        }
    }

    #[test]
    fn render_filters_unlabeled_objects() {
        let bucket = BucketName::new("training-data");
        let objects = vec![
            labeled("training/ICN1/a.png", "cat"),
            unlabeled("training/ICN1/labels.csv"),
            labeled("training/ICN1/b.png", "dog"),
        ];
        let manifest = render_manifest(&bucket, &objects);
        assert_eq!(
            manifest,
            "gs://training-data/training/ICN1/a.png,cat\n\
             gs://training-data/training/ICN1/b.png,dog"
        );
        // No header, no trailing newline.
        assert!(!manifest.ends_with('\n'));
    }

    #[test]
    fn render_does_not_escape_commas() {
        let bucket = BucketName::new("b");
        let objects = vec![labeled("training/ICN1/a.png", "black,white")];
        // The comma lands in the line unescaped: downstream sees three fields.
        assert_eq!(
            render_manifest(&bucket, &objects),
            "gs://b/training/ICN1/a.png,black,white"
        );
    }

    #[test]
    fn manifest_uri_points_under_dataset_prefix() {
        let uri = manifest_uri(&BucketName::new("b"), &DatasetRef::new("ICN7"));
        assert_eq!(uri.as_str(), "gs://b/training/ICN7/labels.csv");
    }
}
