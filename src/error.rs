use std::path::PathBuf;
use thiserror::Error;
use crate::diagnostics::Diagnostic;

pub type Result<T> = std::result::Result<T, Error>;

/// Every diagnostic of a failed compilation. No document is produced.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} errors found in schema", .diagnostics.len())]
pub struct SchemaErrors {
    pub diagnostics: Vec<Diagnostic>,
}

impl SchemaErrors {
    pub fn count(&self) -> usize {
        self.diagnostics.len()
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{} errors found in schema in {source_name}", .errors.count())]
    Schema { source_name: String, errors: SchemaErrors },

    #[error("schema file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("glob pattern matched no files: {0}")]
    NoMatch(String),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("invalid settings in {path}: {message}")]
    Settings { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
