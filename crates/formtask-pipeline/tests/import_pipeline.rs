use std::fs;
use std::path::Path;

use formtask_core::{Answer, ErrorInfo, ImageEncoding, ImportError, Task};
use formtask_pipeline::{build_batch, import_all, FilePairs, ImportConfig};
use formtask_store::{SqliteStore, TaskStore};
use serde_json::json;
use tempfile::{tempdir, NamedTempFile};

/// Store double that records every call it receives.
#[derive(Default)]
struct RecordingStore {
    collections: Vec<String>,
    appended: Vec<Task>,
}

impl TaskStore for RecordingStore {
    fn ensure_collection(&mut self, name: &str) -> Result<bool, ImportError> {
        let created = !self.collections.iter().any(|existing| existing == name);
        if created {
            self.collections.push(name.to_string());
        }
        Ok(created)
    }

    fn append_records(
        &mut self,
        records: &[Task],
        _collections: &[&str],
    ) -> Result<usize, ImportError> {
        self.appended.extend_from_slice(records);
        Ok(records.len())
    }
}

/// Store double whose appends always fail.
#[derive(Default)]
struct FailingStore {
    ensured: usize,
}

fn append_failure() -> ImportError {
    ImportError::Store(
        ErrorInfo::new("store.append_failed", "disk full").with_context("dataset", "forms"),
    )
}

impl TaskStore for FailingStore {
    fn ensure_collection(&mut self, _name: &str) -> Result<bool, ImportError> {
        self.ensured += 1;
        Ok(true)
    }

    fn append_records(
        &mut self,
        _records: &[Task],
        _collections: &[&str],
    ) -> Result<usize, ImportError> {
        Err(append_failure())
    }
}

fn seed(root: &Path, count: usize) -> ImportConfig {
    let images = root.join("images");
    let labels = root.join("labels");
    fs::create_dir_all(&images).expect("images");
    fs::create_dir_all(&labels).expect("labels");
    for idx in 0..count {
        let id = format!("form_{idx:03}");
        fs::write(images.join(format!("{id}.png")), format!("image {idx}")).expect("image");
        let annotation = json!({
            "form": [
                {"box": [idx, 0, idx + 10, 5], "label": "question"},
                {"box": [0, idx, 4, idx + 2], "label": "answer"}
            ]
        });
        fs::write(
            labels.join(format!("{id}.json")),
            serde_json::to_vec(&annotation).expect("json"),
        )
        .expect("label");
    }
    ImportConfig {
        images_root: images,
        labels_root: labels,
        ..ImportConfig::default()
    }
}

#[test]
fn n_pairs_import_as_n_tasks() {
    let dir = tempdir().expect("tempdir");
    let config = seed(dir.path(), 7);
    let mut store = RecordingStore::default();
    let report = import_all(&mut store, &config, "funsd_train").expect("import");
    assert_eq!(report.count, 7);
    assert_eq!(report.distinct_input_hashes, 7);
    assert_eq!(store.collections, vec!["funsd_train".to_string()]);
    assert_eq!(store.appended.len(), 7);
    assert!(store.appended.iter().all(|task| task.answer == Answer::Accept));
}

#[test]
fn missing_annotation_aborts_before_store_mutation() {
    let dir = tempdir().expect("tempdir");
    let config = seed(dir.path(), 3);
    fs::remove_file(config.labels_root.join("form_001.json")).expect("remove");
    let mut store = RecordingStore::default();
    let err = import_all(&mut store, &config, "forms").unwrap_err();
    assert!(matches!(
        err,
        ImportError::MissingPair(ref info) if info.context["identifier"] == "form_001"
    ));
    assert!(store.collections.is_empty());
    assert!(store.appended.is_empty());
}

#[test]
fn orphan_annotation_is_reported_when_pairs_are_required() {
    let dir = tempdir().expect("tempdir");
    let mut config = seed(dir.path(), 2);
    fs::remove_file(config.images_root.join("form_000.png")).expect("remove");
    let mut store = RecordingStore::default();
    let err = import_all(&mut store, &config, "forms").unwrap_err();
    assert_eq!(err.info().context["side"], "image");
    assert!(store.collections.is_empty());

    config.require_complete_pairs = false;
    let report = import_all(&mut store, &config, "forms").expect("lenient import");
    assert_eq!(report.count, 1);
}

#[test]
fn malformed_annotation_aborts_whole_batch() {
    let dir = tempdir().expect("tempdir");
    let config = seed(dir.path(), 4);
    fs::write(
        config.labels_root.join("form_003.json"),
        br#"{"form": [{"label": "header"}]}"#,
    )
    .expect("overwrite");
    let mut store = RecordingStore::default();
    let err = import_all(&mut store, &config, "forms").unwrap_err();
    assert_eq!(err.info().context["field"], "form[0].box");
    assert!(store.appended.is_empty());
}

#[test]
fn empty_dataset_name_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let config = seed(dir.path(), 1);
    let err = import_all(&mut RecordingStore::default(), &config, "  ").unwrap_err();
    assert!(matches!(err, ImportError::Config(_)));
}

#[test]
fn parallel_build_matches_sequential_order() {
    let dir = tempdir().expect("tempdir");
    let config = seed(dir.path(), 25);
    let pairs = FilePairs::from_config(&config);
    let ids = pairs.list_identifiers().expect("ids");
    let sequential =
        build_batch(&pairs, &ids, Answer::Reject, ImageEncoding::Base64, false).expect("seq");
    let parallel =
        build_batch(&pairs, &ids, Answer::Reject, ImageEncoding::Base64, true).expect("par");
    assert_eq!(sequential, parallel);
}

#[test]
fn nested_images_resolve_to_nested_annotations() {
    let dir = tempdir().expect("tempdir");
    let config = seed(dir.path(), 0);
    fs::create_dir_all(config.images_root.join("batch")).expect("nested images");
    fs::create_dir_all(config.labels_root.join("batch")).expect("nested labels");
    fs::write(config.images_root.join("batch/x.png"), b"x").expect("image");
    fs::write(config.labels_root.join("batch/x.json"), br#"{"form": []}"#).expect("label");
    let ids = FilePairs::from_config(&config).list_identifiers().expect("ids");
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[0].as_str(), "batch/x");
    let report = import_all(&mut RecordingStore::default(), &config, "nested").expect("import");
    assert_eq!(report.count, 1);
}

#[test]
fn reimport_keeps_distinct_input_hashes_stable() {
    let dir = tempdir().expect("tempdir");
    let config = seed(dir.path(), 5);
    let db = NamedTempFile::new().expect("db");
    let mut store = SqliteStore::open(db.path()).expect("store");
    import_all(&mut store, &config, "forms").expect("first import");
    let first = store.input_hashes("forms").expect("hashes");
    import_all(&mut store, &config, "forms").expect("second import");
    assert_eq!(store.input_hashes("forms").expect("hashes"), first);
    assert_eq!(store.count("forms").expect("count"), 10);
}

#[test]
fn changing_answer_keeps_input_hashes() {
    let dir = tempdir().expect("tempdir");
    let config = seed(dir.path(), 3);
    let mut accepted = RecordingStore::default();
    let mut rejected = RecordingStore::default();
    import_all(&mut accepted, &config, "a").expect("accept");
    let reject_config = ImportConfig {
        default_answer: Answer::Reject,
        ..config.clone()
    };
    import_all(&mut rejected, &reject_config, "r").expect("reject");
    for (a, r) in accepted.appended.iter().zip(&rejected.appended) {
        assert_eq!(a.input_hash, r.input_hash);
        assert_ne!(a.task_hash, r.task_hash);
    }
}

#[test]
fn store_failure_reaches_the_caller_unchanged() {
    let dir = tempdir().expect("tempdir");
    let config = seed(dir.path(), 3);
    let mut store = FailingStore::default();
    let err = import_all(&mut store, &config, "forms").unwrap_err();
    assert_eq!(err, append_failure());
    assert_eq!(store.ensured, 1);
}

#[test]
fn missing_images_root_is_an_io_error() {
    let dir = tempdir().expect("tempdir");
    let config = ImportConfig {
        images_root: dir.path().join("no_images"),
        labels_root: dir.path().join("no_labels"),
        ..ImportConfig::default()
    };
    let mut store = RecordingStore::default();
    let err = import_all(&mut store, &config, "forms").unwrap_err();
    assert!(matches!(err, ImportError::Io(ref info) if info.code == "formtask.walk"));
    assert!(err.info().context["path"].contains("no_images"));
    assert!(store.collections.is_empty());
    assert!(store.appended.is_empty());
}
