use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::errors::{ErrorInfo, ImportError};

fn serde_error(code: &str, err: impl ToString) -> ImportError {
    ImportError::Serde(ErrorInfo::new(code, err.to_string()))
}

// Object keys end up sorted at every depth; arrays keep their order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, inner)| (key, canonicalize(inner)))
            .collect::<BTreeMap<_, _>>()
            .into_iter()
            .collect::<serde_json::Map<_, _>>()
            .into(),
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        scalar => scalar,
    }
}

/// Serializes a value into canonical JSON bytes with deterministic ordering.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, ImportError> {
    let value = serde_json::to_value(value).map_err(|err| serde_error("json_serialize", err))?;
    serde_json::to_vec(&canonicalize(value)).map_err(|err| serde_error("json_write", err))
}

/// Deserializes a value from JSON bytes.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, ImportError> {
    serde_json::from_slice(data).map_err(|err| serde_error("json_deserialize", err))
}
