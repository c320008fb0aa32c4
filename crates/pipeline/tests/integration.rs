//! Integration tests for the pre-processing pipeline
//!
//! All remote collaborators are in-memory fakes; the tests pin the
//! pipeline's observable contract: skip behavior, idempotent re-runs,
//! operation-id reuse, sequencer halting, and restart semantics.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use datalift_errors::{Error, Result, StateError, StorageError};
use datalift_events::{channel, AppEvent, EventReceiver, ProgressEvent};
use datalift_pipeline::{
    poll_import, resolve_import_operation, run_manifest_stage, run_upload_stage, DatasetService,
    ImportStart, ManifestOutcome, ObjectStore, RecordSource, Sequencer, SequencerConfig,
    StateStore,
};
use datalift_types::{
    object_name, Attachment, BucketName, DatasetRef, ObjectMetadata, OperationId,
    OperationOutcome, OperationTerminal, PipelineSnapshot, ProjectId, RemoteObject, SourceRecord,
    Stage, StorageUri,
};

// ---------------------------------------------------------------------------
// Fakes

struct FakeRecords {
    records: Vec<SourceRecord>,
    attachments: HashMap<String, Vec<u8>>,
    fetches: AtomicUsize,
}

impl FakeRecords {
    fn new(records: Vec<SourceRecord>) -> Self {
        let mut attachments = HashMap::new();
        for record in &records {
            for attachment in &record.attachments {
                attachments.insert(attachment.url.clone(), b"image bytes".to_vec());
            }
        }
        Self {
            records,
            attachments,
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RecordSource for FakeRecords {
    async fn select_records(&self, _table: &str) -> Result<Vec<SourceRecord>> {
        Ok(self.records.clone())
    }

    async fn fetch_attachment(&self, url: &str) -> Result<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.attachments
            .get(url)
            .cloned()
            .ok_or_else(|| Error::internal(format!("no attachment at {url}")))
    }
}

#[derive(Default)]
struct StoredObject {
    media_type: String,
    bytes: Vec<u8>,
    metadata: ObjectMetadata,
}

#[derive(Default)]
struct FakeStore {
    objects: Mutex<HashMap<String, StoredObject>>,
    uploads: AtomicUsize,
    patches: AtomicUsize,
    fail_list: bool,
}

impl FakeStore {
    fn insert_labeled(&self, name: &str, label: &str) {
        let mut metadata = ObjectMetadata::new();
        metadata.insert("label".to_string(), label.to_string());
        self.objects.lock().unwrap().insert(
            name.to_string(),
            StoredObject {
                media_type: "image/png".into(),
                bytes: b"pre-existing".to_vec(),
                metadata,
            },
        );
    }

    fn insert_unlabeled(&self, name: &str) {
        self.objects.lock().unwrap().insert(
            name.to_string(),
            StoredObject {
                media_type: "image/png".into(),
                bytes: b"pre-existing".to_vec(),
                metadata: ObjectMetadata::new(),
            },
        );
    }

    fn object_bytes(&self, name: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(name)
            .map(|o| o.bytes.clone())
    }

    fn label_of(&self, name: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(name)
            .and_then(|o| o.metadata.get("label").cloned())
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn stat(&self, _bucket: &BucketName, name: &str) -> Result<Option<ObjectMetadata>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(name)
            .map(|o| o.metadata.clone()))
    }

    async fn upload(
        &self,
        _bucket: &BucketName,
        name: &str,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.objects.lock().unwrap().insert(
            name.to_string(),
            StoredObject {
                media_type: media_type.to_string(),
                bytes,
                metadata: ObjectMetadata::new(),
            },
        );
        Ok(())
    }

    async fn patch_metadata(
        &self,
        _bucket: &BucketName,
        name: &str,
        metadata: ObjectMetadata,
    ) -> Result<()> {
        self.patches.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .get_mut(name)
            .ok_or_else(|| Error::internal(format!("patch of missing object {name}")))?;
        object.metadata.extend(metadata);
        Ok(())
    }

    async fn list(&self, _bucket: &BucketName, prefix: &str) -> Result<Vec<RemoteObject>> {
        if self.fail_list {
            return Err(StorageError::ListFailed {
                prefix: prefix.to_string(),
                message: "backend unavailable".to_string(),
            }
            .into());
        }
        let objects = self.objects.lock().unwrap();
        let mut listed: Vec<RemoteObject> = objects
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, object)| RemoteObject {
                name: name.clone(),
                metadata: object.metadata.clone(),
            })
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }
}

struct FakeDatasets {
    import_response: Mutex<Option<ImportStart>>,
    running_import: Option<OperationId>,
    poll_script: Mutex<VecDeque<OperationOutcome>>,
    triggers: AtomicUsize,
}

impl FakeDatasets {
    fn succeeding() -> Self {
        Self {
            import_response: Mutex::new(Some(ImportStart::Started(OperationId::new("op-1")))),
            running_import: None,
            poll_script: Mutex::new(VecDeque::from([
                OperationOutcome::Pending,
                OperationOutcome::Done(OperationTerminal::Succeeded),
            ])),
            triggers: AtomicUsize::new(0),
        }
    }

    fn already_running(found: Option<&str>) -> Self {
        Self {
            import_response: Mutex::new(Some(ImportStart::AlreadyRunning)),
            running_import: found.map(OperationId::new),
            poll_script: Mutex::new(VecDeque::from([OperationOutcome::Done(
                OperationTerminal::Succeeded,
            )])),
            triggers: AtomicUsize::new(0),
        }
    }

    fn failing_terminal() -> Self {
        Self {
            import_response: Mutex::new(Some(ImportStart::Started(OperationId::new("op-bad")))),
            running_import: None,
            poll_script: Mutex::new(VecDeque::from([OperationOutcome::Done(
                OperationTerminal::Failed {
                    message: "import failed".into(),
                    partial_failures: vec!["row 2: bad uri".into(), "row 5: unreadable".into()],
                },
            )])),
            triggers: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DatasetService for FakeDatasets {
    async fn import_data(
        &self,
        _project: &ProjectId,
        _dataset: &DatasetRef,
        _source_uri: &StorageUri,
    ) -> Result<ImportStart> {
        self.triggers.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .import_response
            .lock()
            .unwrap()
            .clone()
            .expect("import response configured"))
    }

    async fn find_running_import(
        &self,
        _project: &ProjectId,
        _dataset: &DatasetRef,
    ) -> Result<Option<OperationId>> {
        Ok(self.running_import.clone())
    }

    async fn poll_operation(
        &self,
        _project: &ProjectId,
        _operation: &OperationId,
    ) -> Result<OperationOutcome> {
        Ok(self
            .poll_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(OperationOutcome::Done(OperationTerminal::Succeeded)))
    }
}

#[derive(Default)]
struct MemoryStateStore {
    snapshot: Mutex<Option<PipelineSnapshot>>,
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<PipelineSnapshot> {
        Ok(self
            .snapshot
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_default())
    }

    async fn save(&self, snapshot: &PipelineSnapshot) -> Result<PipelineSnapshot> {
        let mut stored = self.snapshot.lock().unwrap();
        let current_version = stored.as_ref().map_or(0, |s| s.version);
        if snapshot.version != current_version {
            return Err(StateError::Conflict {
                expected: snapshot.version,
            }
            .into());
        }
        let mut next = snapshot.clone();
        next.version += 1;
        *stored = Some(next.clone());
        Ok(next)
    }

    async fn clear(&self) -> Result<()> {
        *self.snapshot.lock().unwrap() = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers

fn attachment(id: &str) -> Attachment {
    Attachment {
        id: id.to_string(),
        media_type: "image/png".to_string(),
        url: format!("https://records.example/files/{id}"),
    }
}

fn record(id: &str, with_image: bool, label: Option<&str>) -> SourceRecord {
    SourceRecord {
        id: id.to_string(),
        attachments: if with_image {
            vec![attachment(&format!("att-{id}"))]
        } else {
            vec![]
        },
        label: label.map(str::to_string),
    }
}

fn config() -> SequencerConfig {
    SequencerConfig {
        project: ProjectId::new("proj"),
        bucket: BucketName::new("training-data"),
        dataset: DatasetRef::new("projects/proj/locations/us-central1/datasets/ICN1"),
        table: "Images".to_string(),
        upload_concurrency: 1,
        poll_interval: Duration::from_millis(1),
    }
}

fn progress_fractions(rx: &mut EventReceiver) -> Vec<(u64, u64)> {
    let mut ticks = Vec::new();
    while let Ok(message) = rx.try_recv() {
        if let AppEvent::Progress(ProgressEvent::Updated {
            id,
            current: Some(current),
            total: Some(total),
            ..
        }) = message.event
        {
            if id == "upload" {
                ticks.push((current, total));
            }
        }
    }
    ticks
}

fn sequencer(
    records: Arc<FakeRecords>,
    store: Arc<FakeStore>,
    datasets: Arc<FakeDatasets>,
    state: Arc<MemoryStateStore>,
) -> (
    Sequencer<FakeRecords, FakeStore, FakeDatasets, MemoryStateStore>,
    EventReceiver,
) {
    let (tx, rx) = channel();
    (
        Sequencer::new(records, store, datasets, state, config(), tx),
        rx,
    )
}

// ---------------------------------------------------------------------------
// Upload stage

#[tokio::test]
async fn upload_skips_incomplete_records_but_progress_reaches_total() {
    // A has image+label, B image only, C label only.
    let records = Arc::new(FakeRecords::new(vec![
        record("a", true, Some("cat")),
        record("b", true, None),
        record("c", false, Some("dog")),
    ]));
    let store = Arc::new(FakeStore::default());
    let (tx, mut rx) = channel();

    let summary = run_upload_stage(
        &records,
        &store,
        &tx,
        &DatasetRef::new("ICN1"),
        &BucketName::new("training-data"),
        "Images",
        1,
    )
    .await
    .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.uploaded, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
    // Skipped records issue no remote calls at all.
    assert_eq!(records.fetches.load(Ordering::SeqCst), 1);

    // Progress ticks 1/3, 2/3, 3/3 regardless of skips.
    assert_eq!(progress_fractions(&mut rx), vec![(1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn upload_rerun_issues_no_calls_for_labeled_objects() {
    let records = Arc::new(FakeRecords::new(vec![record("a", true, Some("cat"))]));
    let store = Arc::new(FakeStore::default());
    store.insert_labeled(&object_name("ICN1", "att-a.png"), "cat");
    let (tx, _rx) = channel();

    let summary = run_upload_stage(
        &records,
        &store,
        &tx,
        &DatasetRef::new("ICN1"),
        &BucketName::new("training-data"),
        "Images",
        1,
    )
    .await
    .unwrap();

    assert_eq!(summary.reused, 1);
    assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(store.patches.load(Ordering::SeqCst), 0);
    assert_eq!(records.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn upload_backfills_label_after_crash_between_upload_and_patch() {
    let records = Arc::new(FakeRecords::new(vec![record("a", true, Some("cat"))]));
    let store = Arc::new(FakeStore::default());
    let name = object_name("ICN1", "att-a.png");
    store.insert_unlabeled(&name);
    let (tx, _rx) = channel();

    let summary = run_upload_stage(
        &records,
        &store,
        &tx,
        &DatasetRef::new("ICN1"),
        &BucketName::new("training-data"),
        "Images",
        1,
    )
    .await
    .unwrap();

    assert_eq!(summary.backfilled, 1);
    assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(store.patches.load(Ordering::SeqCst), 1);
    assert_eq!(store.label_of(&name).as_deref(), Some("cat"));
}

#[tokio::test]
async fn upload_per_record_failure_does_not_abort_batch() {
    // Record "a" references an attachment the fake has no bytes for.
    let mut broken = record("a", true, Some("cat"));
    broken.attachments[0].url = "https://records.example/files/missing".to_string();
    let mut records = FakeRecords::new(vec![record("b", true, Some("dog"))]);
    records.records.insert(0, broken);
    let records = Arc::new(records);
    let store = Arc::new(FakeStore::default());
    let (tx, mut rx) = channel();

    let summary = run_upload_stage(
        &records,
        &store,
        &tx,
        &DatasetRef::new("ICN1"),
        &BucketName::new("training-data"),
        "Images",
        1,
    )
    .await
    .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.uploaded, 1);
    // The failed record still ticked the bar.
    assert_eq!(progress_fractions(&mut rx), vec![(1, 2), (2, 2)]);
}

// ---------------------------------------------------------------------------
// Manifest stage

#[tokio::test]
async fn manifest_created_from_labeled_objects_only() {
    let store = Arc::new(FakeStore::default());
    store.insert_labeled("training/ICN1/a.png", "cat");
    store.insert_labeled("training/ICN1/b.png", "dog");
    store.insert_unlabeled("training/ICN1/c.png");
    let (tx, _rx) = channel();

    let outcome = run_manifest_stage(
        &*store,
        &tx,
        &DatasetRef::new("ICN1"),
        &BucketName::new("training-data"),
    )
    .await
    .unwrap();

    assert_eq!(outcome, ManifestOutcome::Created { entries: 2 });
    let manifest = store
        .object_bytes(&object_name("ICN1", "labels.csv"))
        .unwrap();
    assert_eq!(
        String::from_utf8(manifest).unwrap(),
        "gs://training-data/training/ICN1/a.png,cat\n\
         gs://training-data/training/ICN1/b.png,dog"
    );
}

#[tokio::test]
async fn manifest_rerun_keeps_existing_document_byte_identical() {
    let store = Arc::new(FakeStore::default());
    store.insert_labeled("training/ICN1/a.png", "cat");
    let (tx, _rx) = channel();
    let dataset = DatasetRef::new("ICN1");
    let bucket = BucketName::new("training-data");

    let first = run_manifest_stage(&*store, &tx, &dataset, &bucket)
        .await
        .unwrap();
    assert_eq!(first, ManifestOutcome::Created { entries: 1 });
    let manifest_name = object_name("ICN1", "labels.csv");
    let original = store.object_bytes(&manifest_name).unwrap();
    let uploads_after_first = store.uploads.load(Ordering::SeqCst);

    // New labeled object lands after the manifest was created: the stage
    // intentionally does NOT refresh the stale manifest.
    store.insert_labeled("training/ICN1/late.png", "bird");

    let second = run_manifest_stage(&*store, &tx, &dataset, &bucket)
        .await
        .unwrap();
    assert_eq!(second, ManifestOutcome::AlreadyPresent);
    assert_eq!(store.uploads.load(Ordering::SeqCst), uploads_after_first);
    assert_eq!(store.object_bytes(&manifest_name).unwrap(), original);
}

// ---------------------------------------------------------------------------
// Import stage

#[tokio::test]
async fn import_with_stored_id_never_reissues_trigger() {
    let datasets = FakeDatasets::succeeding();
    let (tx, _rx) = channel();
    let stored = OperationId::new("op-previous");

    let resolved = resolve_import_operation(
        &datasets,
        &tx,
        &ProjectId::new("proj"),
        &DatasetRef::new("ICN1"),
        &StorageUri::new(&BucketName::new("b"), "training/ICN1/labels.csv"),
        &stored,
    )
    .await
    .unwrap();

    assert_eq!(resolved, stored);
    assert_eq!(datasets.triggers.load(Ordering::SeqCst), 0);

    poll_import(
        &datasets,
        &tx,
        &ProjectId::new("proj"),
        &resolved,
        Duration::from_millis(1),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn import_tolerates_already_running_trigger() {
    let datasets = FakeDatasets::already_running(Some("op-live"));
    let (tx, _rx) = channel();

    let resolved = resolve_import_operation(
        &datasets,
        &tx,
        &ProjectId::new("proj"),
        &DatasetRef::new("ICN1"),
        &StorageUri::new(&BucketName::new("b"), "training/ICN1/labels.csv"),
        &OperationId::default(),
    )
    .await
    .unwrap();

    assert_eq!(resolved.as_str(), "op-live");
}

#[tokio::test]
async fn import_terminal_error_collates_partial_failures() {
    let datasets = FakeDatasets::failing_terminal();
    let (tx, _rx) = channel();

    let error = poll_import(
        &datasets,
        &tx,
        &ProjectId::new("proj"),
        &OperationId::new("op-bad"),
        Duration::from_millis(1),
    )
    .await
    .unwrap_err();

    let message = error.to_string();
    assert!(message.contains("import failed"));
    assert!(message.contains("row 2: bad uri"));
    assert!(message.contains("row 5: unreadable"));
}

// ---------------------------------------------------------------------------
// Sequencer

#[tokio::test]
async fn full_pipeline_runs_to_done() {
    let records = Arc::new(FakeRecords::new(vec![
        record("a", true, Some("cat")),
        record("b", true, Some("dog")),
    ]));
    let store = Arc::new(FakeStore::default());
    let datasets = Arc::new(FakeDatasets::succeeding());
    let state = Arc::new(MemoryStateStore::default());
    let (seq, _rx) = sequencer(records, store.clone(), datasets.clone(), state.clone());

    let snapshot = seq.run().await.unwrap();

    assert!(snapshot.is_done());
    assert_eq!(snapshot.completed_steps.len(), 3);
    assert!(snapshot.completed_steps.iter().all(|s| s.status));
    assert_eq!(snapshot.operation_id.as_str(), "op-1");
    assert!((snapshot.progress - 1.0).abs() < f64::EPSILON);
    assert_eq!(datasets.triggers.load(Ordering::SeqCst), 1);
    assert_eq!(store.uploads.load(Ordering::SeqCst), 3); // 2 images + manifest
}

#[tokio::test]
async fn stage2_failure_halts_before_stage3() {
    let records = Arc::new(FakeRecords::new(vec![record("a", true, Some("cat"))]));
    let store = Arc::new(FakeStore {
        fail_list: true,
        ..FakeStore::default()
    });
    let datasets = Arc::new(FakeDatasets::succeeding());
    let state = Arc::new(MemoryStateStore::default());
    let (seq, _rx) = sequencer(records, store, datasets.clone(), state.clone());

    let snapshot = seq.run().await.unwrap();

    assert!(snapshot.is_failed());
    let last = snapshot.last_step().unwrap();
    assert_eq!(last.name, Stage::Manifest.step_name());
    assert!(!last.status);
    // Stage pointer did not advance; the import never triggered.
    assert_eq!(snapshot.stage, Some(Stage::Manifest));
    assert_eq!(datasets.triggers.load(Ordering::SeqCst), 0);
    assert!(!snapshot.error_message.is_empty());

    // Re-running while failed stays halted without redoing work.
    let again = seq.run().await.unwrap();
    assert_eq!(again.completed_steps.len(), 2);
}

#[tokio::test]
async fn import_terminal_error_recorded_as_stage_failure() {
    let records = Arc::new(FakeRecords::new(vec![record("a", true, Some("cat"))]));
    let store = Arc::new(FakeStore::default());
    let datasets = Arc::new(FakeDatasets::failing_terminal());
    let state = Arc::new(MemoryStateStore::default());
    let (seq, _rx) = sequencer(records, store, datasets, state);

    let snapshot = seq.run().await.unwrap();

    assert!(snapshot.is_failed());
    let last = snapshot.last_step().unwrap();
    assert_eq!(last.name, Stage::Import.step_name());
    assert!(snapshot.error_message.contains("import failed"));
    assert!(snapshot.error_message.contains("row 2: bad uri"));
}

#[tokio::test]
async fn resumed_run_reuses_persisted_operation_id() {
    let records = Arc::new(FakeRecords::new(vec![record("a", true, Some("cat"))]));
    let store = Arc::new(FakeStore::default());
    let datasets = Arc::new(FakeDatasets::succeeding());
    let state = Arc::new(MemoryStateStore::default());

    // Seed persisted state as if a prior run crashed mid-poll in stage 3.
    {
        let seeded = PipelineSnapshot {
            stage: Some(Stage::Import),
            operation_id: OperationId::new("op-resumed"),
            completed_steps: vec![
                datalift_types::StepOutcome::success(Stage::Upload.step_name()),
                datalift_types::StepOutcome::success(Stage::Manifest.step_name()),
            ],
            progress: 0.66,
            current_step: Stage::Import.step_label(),
            error_message: String::new(),
            version: 0,
        };
        state.save(&seeded).await.unwrap();
    }

    let (seq, _rx) = sequencer(records, store, datasets.clone(), state);
    let snapshot = seq.run().await.unwrap();

    assert!(snapshot.is_done());
    // The stored id was polled; no new trigger was issued.
    assert_eq!(datasets.triggers.load(Ordering::SeqCst), 0);
    assert_eq!(snapshot.operation_id.as_str(), "op-resumed");
}

#[tokio::test]
async fn restart_clears_to_first_entry_state() {
    let records = Arc::new(FakeRecords::new(vec![record("a", true, Some("cat"))]));
    let store = Arc::new(FakeStore {
        fail_list: true,
        ..FakeStore::default()
    });
    let datasets = Arc::new(FakeDatasets::succeeding());
    let state = Arc::new(MemoryStateStore::default());
    let (seq, _rx) = sequencer(records, store, datasets, state.clone());

    let failed = seq.run().await.unwrap();
    assert!(failed.is_failed());

    seq.restart().await.unwrap();

    let fresh = state.load().await.unwrap();
    assert_eq!(fresh.stage, None);
    assert!(fresh.completed_steps.is_empty());
    assert!(fresh.progress.abs() < f64::EPSILON);
    assert!(fresh.error_message.is_empty());
    assert!(fresh.operation_id.is_empty());
}

#[tokio::test]
async fn stale_snapshot_save_is_rejected() {
    let state = MemoryStateStore::default();
    let first = state.save(&PipelineSnapshot::default()).await.unwrap();
    assert_eq!(first.version, 1);

    // A concurrent tick saved meanwhile; the stale snapshot must lose.
    let stale = PipelineSnapshot::default();
    let error = state.save(&stale).await.unwrap_err();
    assert!(matches!(
        error,
        Error::State(StateError::Conflict { .. })
    ));
}
