use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use formtask_core::{
    parse_form, Answer, ErrorInfo, ImageEncoding, ImageSource, ImportError, Span, Task, TaskDraft,
};
use serde_json::Value;
use tracing::debug;

use crate::files::{read_error, FilePairs, Identifier};

const MIME_LINE_LENGTH: usize = 76;

/// Base64 with a newline after every 76 characters and after the last line.
pub fn encode_mime_base64(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / MIME_LINE_LENGTH + 1);
    for (idx, ch) in encoded.chars().enumerate() {
        if idx > 0 && idx % MIME_LINE_LENGTH == 0 {
            out.push('\n');
        }
        out.push(ch);
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn image_reference(
    pairs: &FilePairs,
    id: &Identifier,
    image: &Path,
) -> Result<String, ImportError> {
    image.to_str().map(str::to_string).ok_or_else(|| {
        ImportError::Config(
            ErrorInfo::new("formtask.image_path_utf8", "image path is not valid UTF-8")
                .with_context("identifier", id.as_str())
                .with_context("root", pairs.images_root().display().to_string())
                .with_hint("use a UTF-8 images root or base64 encoding"),
        )
    })
}

/// Builds the task for one identifier.
///
/// Reads the image, encodes or references it, converts every annotated box
/// to a span in source order and fingerprints the result. Any missing file or
/// malformed annotation aborts with an error naming the identifier.
pub fn build_task(
    pairs: &FilePairs,
    id: &Identifier,
    answer: Answer,
    encoding: ImageEncoding,
) -> Result<Task, ImportError> {
    let paths = pairs.resolve(id);

    let image_bytes =
        fs::read(&paths.image).map_err(|err| read_error(id, "image", &paths.image, &err))?;
    let image = match encoding {
        ImageEncoding::Path => ImageSource::Path(image_reference(pairs, id, &paths.image)?),
        ImageEncoding::Base64 => ImageSource::Base64(encode_mime_base64(&image_bytes)),
    };

    let annotation_bytes = fs::read(&paths.annotation)
        .map_err(|err| read_error(id, "annotation", &paths.annotation, &err))?;
    let record: Value = serde_json::from_slice(&annotation_bytes).map_err(|err| {
        ImportError::MalformedAnnotation(
            ErrorInfo::new("formtask.annotation_json", err.to_string())
                .with_context("identifier", id.as_str())
                .with_context("path", paths.annotation.display().to_string()),
        )
    })?;
    let spans: Vec<Span> = parse_form(id.as_str(), &record)?
        .iter()
        .map(Span::from)
        .collect();

    debug!(identifier = %id, spans = spans.len(), "built task");
    TaskDraft {
        image,
        spans,
        answer,
    }
    .seal()
}
