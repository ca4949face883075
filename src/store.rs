use std::path::{Path, PathBuf};

use crate::api::PageAnnots;
use crate::error::{MergeError, OpenError, SaveError, ScanError};

/// Capability seam between the sync core and whatever actually holds the
/// documents. Production uses the lopdf-backed store in `pdf`; tests use an
/// in-memory fake so the merge protocol can be exercised without touching a
/// real document library.
pub trait DocumentStore: Send + Sync {
    fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError>;
    fn open(&self, path: &Path) -> Result<Box<dyn Document>, OpenError>;
}

/// One open document. The sync core holds at most one of these at a time
/// and calls `close` on every exit path.
pub trait Document {
    /// Current per-page annotation records.
    fn annotations(&self) -> PageAnnots;

    /// Stable fingerprint of the document content; deterministic for
    /// identical content and unchanged by annotation edits.
    fn content_hash(&self) -> String;

    /// Apply incoming records. Returns how many were newly applied even
    /// when an error is also returned; the count reflects work done up to
    /// the failure. The store may dedup, so the count can be less than the
    /// number of records offered.
    fn merge(&mut self, incoming: &PageAnnots) -> (usize, Option<MergeError>);

    fn persist(&mut self) -> Result<(), SaveError>;

    /// Idempotent, always safe to call.
    fn close(&mut self);
}
