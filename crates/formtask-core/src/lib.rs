#![deny(missing_docs)]
#![doc = "Core data model, geometry and content hashing for formtask."]

/// Structured error types.
pub mod errors;
/// Bounding box and polygon geometry.
pub mod geometry;
/// Content fingerprinting.
pub mod hash;
/// Annotation, span and task records.
pub mod model;
/// Canonical JSON serde helpers.
pub mod serde;

pub use errors::{ErrorInfo, ImportError};
pub use geometry::{box_to_polygon, BoundingBox, Coordinate, Point, Polygon};
pub use hash::{hash_task, stable_hash_string, TaskHashes};
pub use model::{
    parse_form, Annotation, Answer, ImageEncoding, ImageSource, Span, Task, TaskDraft,
};
pub use crate::serde::{from_json_slice, to_canonical_json_bytes};
