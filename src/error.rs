use std::error::Error;
use std::path::PathBuf;

use thiserror::Error;

/// The walk itself failed. Aborts the whole request; surfaced as a 500.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("cannot resolve path {}", .path.display())]
    Resolve {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A single document could not be opened. Isolates that file only.
#[derive(Debug, Error)]
#[error("open {}: {reason}", .path.display())]
pub struct OpenError {
    pub path: PathBuf,
    pub reason: String,
}

/// Applying annotations to an open document failed partway.
#[derive(Debug, Error)]
#[error("merge failed: {0}")]
pub struct MergeError(pub String);

/// Persisting a merged document failed.
#[derive(Debug, Error)]
#[error("save failed: {0}")]
pub struct SaveError(pub String);

/// Flatten an error and its source chain into one string for the per-file
/// error field of an import outcome.
pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
