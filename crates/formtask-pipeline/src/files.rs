//! Image/annotation pairing by shared file stem.

use std::fmt::{self, Display};
use std::path::{Component, Path, PathBuf};

use formtask_core::{ErrorInfo, ImportError};
use walkdir::WalkDir;

use crate::config::ImportConfig;

/// Join key between an image and its annotation.
///
/// The file stem, prefixed by its directory relative to the root when the
/// file is nested (`scans/0001`). Flat layouts yield plain stems.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(raw: impl Into<String>) -> Result<Self, ImportError> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && raw
                .split('/')
                .all(|part| !part.is_empty() && part != "." && part != "..");
        if !valid {
            return Err(ImportError::InvalidIdentifier(
                ErrorInfo::new("formtask.identifier", "identifier is empty or not relative")
                    .with_context("identifier", raw),
            ));
        }
        Ok(Self(raw))
    }

    /// Derives the identifier of a file from its path relative to a root.
    pub fn from_relative(rel: &Path) -> Result<Self, ImportError> {
        let invalid = |reason: &str| {
            ImportError::InvalidIdentifier(
                ErrorInfo::new("formtask.identifier", reason)
                    .with_context("path", rel.display().to_string()),
            )
        };
        let stem = rel
            .file_stem()
            .ok_or_else(|| invalid("file has no stem"))?
            .to_str()
            .ok_or_else(|| invalid("file stem is not valid UTF-8"))?;
        let mut parts = Vec::new();
        if let Some(parent) = rel.parent() {
            for component in parent.components() {
                match component {
                    Component::Normal(part) => parts.push(
                        part.to_str()
                            .ok_or_else(|| invalid("directory name is not valid UTF-8"))?,
                    ),
                    _ => return Err(invalid("path escapes its root")),
                }
            }
        }
        parts.push(stem);
        Self::new(parts.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved locations of one identifier. Existence is not checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairPaths {
    pub image: PathBuf,
    pub annotation: PathBuf,
}

/// Resolves identifiers against an images root and a labels root.
#[derive(Debug, Clone)]
pub struct FilePairs {
    images_root: PathBuf,
    labels_root: PathBuf,
    image_extension: String,
    label_extension: String,
}

fn walk_error(root: &Path, err: walkdir::Error) -> ImportError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    ImportError::Io(
        ErrorInfo::new("formtask.walk", err.to_string())
            .with_context("path", path.display().to_string()),
    )
}

impl FilePairs {
    pub fn new(images_root: impl Into<PathBuf>, labels_root: impl Into<PathBuf>) -> Self {
        Self {
            images_root: images_root.into(),
            labels_root: labels_root.into(),
            image_extension: "png".to_string(),
            label_extension: "json".to_string(),
        }
    }

    pub fn with_extensions(mut self, image: impl Into<String>, label: impl Into<String>) -> Self {
        self.image_extension = image.into();
        self.label_extension = label.into();
        self
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(&config.images_root, &config.labels_root)
            .with_extensions(&config.image_extension, &config.label_extension)
    }

    pub fn images_root(&self) -> &Path {
        &self.images_root
    }

    pub fn labels_root(&self) -> &Path {
        &self.labels_root
    }

    /// Enumerates every regular file below the images root.
    ///
    /// Entries are visited in file name order, so one invocation always
    /// batches identically. Any file counts, whatever its extension.
    pub fn list_identifiers(&self) -> Result<Vec<Identifier>, ImportError> {
        let mut identifiers = Vec::new();
        for entry in WalkDir::new(&self.images_root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| walk_error(&self.images_root, err))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.images_root)
                .unwrap_or(entry.path());
            identifiers.push(Identifier::from_relative(rel)?);
        }
        Ok(identifiers)
    }

    pub fn resolve(&self, id: &Identifier) -> PairPaths {
        PairPaths {
            image: self
                .images_root
                .join(format!("{}.{}", id.as_str(), self.image_extension)),
            annotation: self
                .labels_root
                .join(format!("{}.{}", id.as_str(), self.label_extension)),
        }
    }

    /// Annotation files below the labels root whose image does not exist.
    pub fn orphan_annotations(&self) -> Result<Vec<Identifier>, ImportError> {
        let mut orphans = Vec::new();
        for entry in WalkDir::new(&self.labels_root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| walk_error(&self.labels_root, err))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let has_label_ext = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext == self.label_extension);
            if !has_label_ext {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.labels_root)
                .unwrap_or(entry.path());
            let id = Identifier::from_relative(rel)?;
            if !self.resolve(&id).image.is_file() {
                orphans.push(id);
            }
        }
        Ok(orphans)
    }

    /// Fails with [`ImportError::MissingPair`] on the first orphaned annotation.
    pub fn ensure_complete(&self) -> Result<(), ImportError> {
        let orphans = self.orphan_annotations()?;
        if let Some(first) = orphans.first() {
            let paths = self.resolve(first);
            return Err(ImportError::MissingPair(
                ErrorInfo::new(
                    "formtask.missing_pair",
                    format!("annotation has no matching image ({} orphaned)", orphans.len()),
                )
                .with_context("identifier", first.as_str())
                .with_context("side", "image")
                .with_context("path", paths.image.display().to_string()),
            ));
        }
        Ok(())
    }
}

/// Maps a failed read to `MissingPair` when the file is absent, `Io` otherwise.
pub(crate) fn read_error(
    id: &Identifier,
    side: &str,
    path: &Path,
    err: &std::io::Error,
) -> ImportError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return ImportError::MissingPair(
            ErrorInfo::new("formtask.missing_pair", format!("no {side} file for identifier"))
                .with_context("identifier", id.as_str())
                .with_context("side", side)
                .with_context("path", path.display().to_string()),
        );
    }
    ImportError::Io(
        ErrorInfo::new("formtask.read", err.to_string())
            .with_context("identifier", id.as_str())
            .with_context("side", side)
            .with_context("path", path.display().to_string()),
    )
}
