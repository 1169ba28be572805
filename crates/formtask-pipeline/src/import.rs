use std::collections::BTreeSet;

use formtask_core::{Answer, ErrorInfo, ImageEncoding, ImportError, Task};
use formtask_store::TaskStore;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::builder::build_task;
use crate::config::ImportConfig;
use crate::files::{FilePairs, Identifier};

/// Outcome of a committed import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub dataset: String,
    /// Number of tasks appended.
    pub count: usize,
    pub distinct_input_hashes: usize,
}

/// Builds one task per identifier, preserving identifier order.
///
/// The first failing identifier aborts the whole batch, also when the work is
/// spread over the rayon pool.
pub fn build_batch(
    pairs: &FilePairs,
    ids: &[Identifier],
    answer: Answer,
    encoding: ImageEncoding,
    parallel: bool,
) -> Result<Vec<Task>, ImportError> {
    if parallel {
        ids.par_iter()
            .map(|id| build_task(pairs, id, answer, encoding))
            .collect()
    } else {
        ids.iter()
            .map(|id| build_task(pairs, id, answer, encoding))
            .collect()
    }
}

/// Discovers every image, builds its task and commits the batch to `set_id`.
///
/// Nothing touches the store until every task has been built, so input errors
/// never leave a half-written dataset behind.
pub fn import_all<S: TaskStore + ?Sized>(
    store: &mut S,
    config: &ImportConfig,
    set_id: &str,
) -> Result<ImportReport, ImportError> {
    if set_id.trim().is_empty() {
        return Err(ImportError::Config(ErrorInfo::new(
            "formtask.dataset_name",
            "dataset name must not be empty",
        )));
    }
    config.validate()?;
    let pairs = FilePairs::from_config(config);

    let ids = pairs.list_identifiers()?;
    info!(
        count = ids.len(),
        root = %pairs.images_root().display(),
        "found images and annotations"
    );
    if config.require_complete_pairs {
        pairs.ensure_complete()?;
    }
    if config.encoding == ImageEncoding::Base64 {
        info!("encoding images into their base64 representation");
    }
    let tasks = build_batch(
        &pairs,
        &ids,
        config.default_answer,
        config.encoding,
        config.parallel,
    )?;

    store.ensure_collection(set_id)?;
    let count = store.append_records(&tasks, &[set_id])?;
    let distinct_input_hashes = tasks
        .iter()
        .map(|task| task.input_hash.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    info!(dataset = set_id, count, "imported tasks");
    Ok(ImportReport {
        dataset: set_id.to_string(),
        count,
        distinct_input_hashes,
    })
}
