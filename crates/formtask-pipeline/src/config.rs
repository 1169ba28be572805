use std::fs;
use std::path::{Path, PathBuf};

use formtask_core::{Answer, ErrorInfo, ImageEncoding, ImportError};
use serde::{Deserialize, Serialize};

/// TOML-configurable parameters governing an import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportConfig {
    /// Root directory scanned recursively for images.
    #[serde(default = "default_images_root")]
    pub images_root: PathBuf,
    /// Root directory holding one annotation file per image.
    #[serde(default = "default_labels_root")]
    pub labels_root: PathBuf,
    /// Extension used to resolve an identifier to its image.
    #[serde(default = "default_image_extension")]
    pub image_extension: String,
    /// Extension used to resolve an identifier to its annotation.
    #[serde(default = "default_label_extension")]
    pub label_extension: String,
    /// Answer stored on every imported task.
    #[serde(default)]
    pub default_answer: Answer,
    /// Whether tasks reference images by path or embed them as base64.
    #[serde(default)]
    pub encoding: ImageEncoding,
    /// Build tasks on the rayon pool instead of sequentially.
    #[serde(default)]
    pub parallel: bool,
    /// Fail when an annotation file has no matching image.
    #[serde(default = "default_require_complete_pairs")]
    pub require_complete_pairs: bool,
}

fn default_images_root() -> PathBuf {
    PathBuf::from("data/train/images")
}

fn default_labels_root() -> PathBuf {
    PathBuf::from("data/train/labels")
}

fn default_image_extension() -> String {
    "png".to_string()
}

fn default_label_extension() -> String {
    "json".to_string()
}

fn default_require_complete_pairs() -> bool {
    true
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            images_root: default_images_root(),
            labels_root: default_labels_root(),
            image_extension: default_image_extension(),
            label_extension: default_label_extension(),
            default_answer: Answer::default(),
            encoding: ImageEncoding::default(),
            parallel: false,
            require_complete_pairs: default_require_complete_pairs(),
        }
    }
}

fn config_error(code: &str, message: impl Into<String>) -> ImportError {
    ImportError::Config(ErrorInfo::new(code, message))
}

impl ImportConfig {
    /// Loads a config file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let contents = fs::read_to_string(path)
            .map_err(|err| ImportError::io("formtask.config_read", path, &err))?;
        let config: Self = toml::from_str(&contents).map_err(|err| {
            ImportError::Config(
                ErrorInfo::new("formtask.config_parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ImportError> {
        if self.images_root.as_os_str().is_empty() {
            return Err(config_error("formtask.config_images_root", "images_root is empty"));
        }
        if self.labels_root.as_os_str().is_empty() {
            return Err(config_error("formtask.config_labels_root", "labels_root is empty"));
        }
        for (name, ext) in [
            ("image_extension", &self.image_extension),
            ("label_extension", &self.label_extension),
        ] {
            if ext.trim().is_empty() || ext.starts_with('.') {
                return Err(ImportError::Config(
                    ErrorInfo::new(
                        "formtask.config_extension",
                        format!("{name} must be a bare extension"),
                    )
                    .with_context("value", ext.as_str())
                    .with_hint("use e.g. \"png\" rather than \".png\""),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_uses_defaults() {
        let config: ImportConfig =
            toml::from_str("encoding = \"base64\"\ndefault_answer = \"reject\"").unwrap();
        assert_eq!(config.encoding, ImageEncoding::Base64);
        assert_eq!(config.default_answer, Answer::Reject);
        assert_eq!(config.image_extension, "png");
        assert!(config.require_complete_pairs);
    }

    #[test]
    fn dotted_extension_is_rejected() {
        let config = ImportConfig {
            label_extension: ".json".into(),
            ..ImportConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.info().code, "formtask.config_extension");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<ImportConfig>("images = \"x\"").is_err());
    }
}
