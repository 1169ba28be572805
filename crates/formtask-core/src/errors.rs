//! Structured error types shared across formtask crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`ImportError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (identifiers, paths, field names).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the import pipeline.
///
/// Every variant aborts the current batch; there is no partial-success mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ImportError {
    /// An identifier exists on one side of the image/annotation join only.
    #[error("missing pair: {0}")]
    MissingPair(ErrorInfo),
    /// An annotation record is structurally invalid.
    #[error("malformed annotation: {0}")]
    MalformedAnnotation(ErrorInfo),
    /// A file could not be read or enumerated.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// The store collaborator rejected a collection or append operation.
    #[error("store error: {0}")]
    Store(ErrorInfo),
    /// Serialization and canonicalisation errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// Invalid configuration or command input.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// A discovered file does not yield a usable identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl ImportError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ImportError::MissingPair(info)
            | ImportError::MalformedAnnotation(info)
            | ImportError::Io(info)
            | ImportError::Store(info)
            | ImportError::Serde(info)
            | ImportError::Config(info)
            | ImportError::InvalidIdentifier(info) => info,
        }
    }

    /// Wraps an I/O failure, recording the path it happened on.
    pub fn io(code: &str, path: &std::path::Path, err: &std::io::Error) -> Self {
        ImportError::Io(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
