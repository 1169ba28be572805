use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::errors::ImportError;
use crate::model::{Answer, ImageSource, Span, Task, TaskDraft};
use crate::serde::to_canonical_json_bytes;

/// Fingerprints computed for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskHashes {
    /// Hash over image and spans only.
    pub input_hash: String,
    /// Hash over image, spans and answer.
    pub task_hash: String,
}

#[derive(Serialize)]
struct InputView<'a> {
    image: &'a ImageSource,
    spans: &'a [Span],
}

#[derive(Serialize)]
struct TaskView<'a> {
    image: &'a ImageSource,
    spans: &'a [Span],
    answer: Answer,
}

/// Returns the hex SHA-256 of the canonical JSON rendering of `value`.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, ImportError> {
    let bytes = to_canonical_json_bytes(value)?;
    Ok(hex::encode(Sha256::digest(bytes)))
}

/// Computes the input and task fingerprints of a draft.
pub fn hash_task(draft: &TaskDraft) -> Result<TaskHashes, ImportError> {
    let input_hash = stable_hash_string(&InputView {
        image: &draft.image,
        spans: &draft.spans,
    })?;
    let task_hash = stable_hash_string(&TaskView {
        image: &draft.image,
        spans: &draft.spans,
        answer: draft.answer,
    })?;
    Ok(TaskHashes {
        input_hash,
        task_hash,
    })
}

impl TaskDraft {
    /// Fingerprints the draft and freezes it into a [`Task`].
    pub fn seal(self) -> Result<Task, ImportError> {
        let TaskHashes {
            input_hash,
            task_hash,
        } = hash_task(&self)?;
        Ok(Task {
            image: self.image,
            spans: self.spans,
            answer: self.answer,
            input_hash,
            task_hash,
        })
    }
}
