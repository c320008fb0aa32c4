//! Contracts the pipeline consumes.
//!
//! The pipeline only orchestrates; every remote effect goes through one of
//! these traits. Production implementations live in the `datalift-records`,
//! `datalift-gcloud`, and `datalift-state` crates.

use async_trait::async_trait;

use datalift_errors::Result;
use datalift_types::{
    BucketName, DatasetRef, ObjectMetadata, OperationId, OperationOutcome, PipelineSnapshot,
    ProjectId, RemoteObject, SourceRecord, StorageUri,
};

/// Source of candidate records and their attachment bytes
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch every record of the source table, field-resolved into
    /// [`SourceRecord`]s.
    async fn select_records(&self, table: &str) -> Result<Vec<SourceRecord>>;

    /// Fetch the raw bytes behind an attachment URL.
    async fn fetch_attachment(&self, url: &str) -> Result<Vec<u8>>;
}

/// Remote object storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Metadata of the object, or `None` when it does not exist.
    ///
    /// Returning the metadata map (not a bare bool) is what lets the upload
    /// stage backfill labels lost to a crash between upload and patch.
    async fn stat(&self, bucket: &BucketName, name: &str) -> Result<Option<ObjectMetadata>>;

    /// Upload an object with the given media type.
    async fn upload(
        &self,
        bucket: &BucketName,
        name: &str,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> Result<()>;

    /// Merge custom metadata onto an existing object.
    async fn patch_metadata(
        &self,
        bucket: &BucketName,
        name: &str,
        metadata: ObjectMetadata,
    ) -> Result<()>;

    /// List objects under a prefix.
    async fn list(&self, bucket: &BucketName, prefix: &str) -> Result<Vec<RemoteObject>>;
}

/// Result of an import trigger
#[derive(Debug, Clone)]
pub enum ImportStart {
    /// A new operation was started
    Started(OperationId),
    /// The remote reports an import already in progress; not fatal
    AlreadyRunning,
}

/// Managed dataset-import and operation-polling API
#[async_trait]
pub trait DatasetService: Send + Sync {
    /// Trigger an import of the manifest into the dataset.
    async fn import_data(
        &self,
        project: &ProjectId,
        dataset: &DatasetRef,
        source_uri: &StorageUri,
    ) -> Result<ImportStart>;

    /// Locate the currently running import operation for a dataset, if any.
    /// Used when the trigger reports "already running" but no id was stored.
    async fn find_running_import(
        &self,
        project: &ProjectId,
        dataset: &DatasetRef,
    ) -> Result<Option<OperationId>>;

    /// Observe a long-running operation once.
    async fn poll_operation(
        &self,
        project: &ProjectId,
        operation: &OperationId,
    ) -> Result<OperationOutcome>;
}

/// Persisted pipeline snapshot storage.
///
/// `save` is a compare-and-swap on the snapshot's `version`: the stored row
/// must still carry `snapshot.version`, and the returned snapshot has the
/// bumped stamp. A stale writer gets `StateError::Conflict`.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the current snapshot, or the default one when none is stored.
    async fn load(&self) -> Result<PipelineSnapshot>;

    /// Persist a snapshot; returns it with the bumped version stamp.
    async fn save(&self, snapshot: &PipelineSnapshot) -> Result<PipelineSnapshot>;

    /// Drop all persisted pipeline state (explicit restart).
    async fn clear(&self) -> Result<()>;
}
