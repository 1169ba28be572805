//! Annotation, span and task records.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ErrorInfo, ImportError};
use crate::geometry::{box_to_polygon, BoundingBox, Polygon};

/// Review decision stored with every task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    /// The annotation is accepted as is.
    #[default]
    Accept,
    /// The annotation is rejected.
    Reject,
    /// The example is skipped.
    Ignore,
}

impl Answer {
    /// Wire name of the answer.
    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Accept => "accept",
            Answer::Reject => "reject",
            Answer::Ignore => "ignore",
        }
    }
}

impl Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Answer {
    type Err = ImportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(Answer::Accept),
            "reject" => Ok(Answer::Reject),
            "ignore" => Ok(Answer::Ignore),
            other => Err(ImportError::Config(
                ErrorInfo::new("formtask.answer", format!("unknown answer '{other}'"))
                    .with_hint("expected one of accept, reject, ignore"),
            )),
        }
    }
}

/// How the image bytes are carried inside a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    /// Reference the image by its file path.
    #[default]
    Path,
    /// Embed the image bytes as base64 text.
    Base64,
}

/// The `image` field of a task: exactly one of a path or an inline payload.
///
/// Both variants serialise as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ImageSource {
    /// Filesystem path reference.
    Path(String),
    /// Base64 encoded image bytes.
    Base64(String),
}

impl ImageSource {
    /// Returns the string carried on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            ImageSource::Path(value) | ImageSource::Base64(value) => value,
        }
    }

    /// Returns the encoding this source was produced with.
    pub fn encoding(&self) -> ImageEncoding {
        match self {
            ImageSource::Path(_) => ImageEncoding::Path,
            ImageSource::Base64(_) => ImageEncoding::Base64,
        }
    }
}

/// One labelled region of a source annotation file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Region bounds.
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    /// Region label.
    pub label: String,
}

/// Converted region as it appears inside a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Clockwise polygon starting at the top-left corner.
    pub points: Polygon,
    /// Region label.
    pub label: String,
}

impl From<&Annotation> for Span {
    fn from(annotation: &Annotation) -> Self {
        Self {
            points: box_to_polygon(&annotation.bbox),
            label: annotation.label.clone(),
        }
    }
}

/// Task content before fingerprinting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDraft {
    /// Image reference or payload.
    pub image: ImageSource,
    /// Converted regions in source order.
    pub spans: Vec<Span>,
    /// Review decision.
    pub answer: Answer,
}

/// Canonical review unit handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    /// Image reference or payload.
    pub image: ImageSource,
    /// Converted regions in source order.
    pub spans: Vec<Span>,
    /// Review decision.
    pub answer: Answer,
    /// Fingerprint of the reviewable content (image and spans).
    pub input_hash: String,
    /// Fingerprint of the full task including the answer.
    pub task_hash: String,
}

fn field_error(identifier: &str, field: &str, message: impl Into<String>) -> ImportError {
    ImportError::MalformedAnnotation(
        ErrorInfo::new("formtask.annotation_field", message)
            .with_context("identifier", identifier)
            .with_context("field", field),
    )
}

/// Extracts the ordered region list from a parsed annotation record.
///
/// The record must be an object with a `form` array whose entries carry a
/// `box` of four numbers and a string `label`. Errors name the offending
/// field path, e.g. `form[2].label`.
pub fn parse_form(identifier: &str, record: &Value) -> Result<Vec<Annotation>, ImportError> {
    let form = record
        .get("form")
        .ok_or_else(|| field_error(identifier, "form", "annotation has no 'form' key"))?;
    let entries = form
        .as_array()
        .ok_or_else(|| field_error(identifier, "form", "'form' is not a list"))?;
    let mut annotations = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let raw_box = entry.get("box").ok_or_else(|| {
            field_error(identifier, &format!("form[{idx}].box"), "region has no 'box'")
        })?;
        let bbox: BoundingBox = serde_json::from_value(raw_box.clone()).map_err(|err| {
            field_error(
                identifier,
                &format!("form[{idx}].box"),
                format!("invalid box: {err}"),
            )
        })?;
        let label = entry.get("label").ok_or_else(|| {
            field_error(
                identifier,
                &format!("form[{idx}].label"),
                "region has no 'label'",
            )
        })?;
        let label = label.as_str().ok_or_else(|| {
            field_error(
                identifier,
                &format!("form[{idx}].label"),
                "label is not a string",
            )
        })?;
        annotations.push(Annotation {
            bbox,
            label: label.to_string(),
        });
    }
    Ok(annotations)
}
