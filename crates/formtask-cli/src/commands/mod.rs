pub mod datasets;
pub mod export;
pub mod import;
