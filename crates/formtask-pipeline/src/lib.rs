//! Turns a directory of annotated form images into review tasks.

pub mod builder;
pub mod config;
pub mod files;
pub mod import;

pub use builder::{build_task, encode_mime_base64};
pub use config::ImportConfig;
pub use files::{FilePairs, Identifier, PairPaths};
pub use import::{build_batch, import_all, ImportReport};
