use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ScanError;

const DOC_EXTENSION: &str = "pdf";

/// Walk `root` and return the absolute path of every document file under it.
///
/// Depth-first, lexicographic within each directory, so the order is
/// deterministic for a given tree; the import summary inherits this order.
/// Matching is on the exact lowercase `.pdf` extension; directories and
/// other files are skipped. Traversal errors are propagated, not swallowed.
pub fn scan(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if root.exists() && !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut docs = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        // Extension match is exact and case-sensitive: `.PDF` is not a hit.
        if entry.path().extension().and_then(|e| e.to_str()) != Some(DOC_EXTENSION) {
            continue;
        }
        let abs = std::path::absolute(entry.path()).map_err(|e| ScanError::Resolve {
            path: entry.path().to_path_buf(),
            source: e,
        })?;
        docs.push(abs);
    }

    Ok(docs)
}
