use std::collections::HashMap;
use std::path::Path;

use crate::api::{DocumentSummary, ImportOutcome, ImportSummary, PageAnnots};
use crate::error::{ScanError, unpack_error};
use crate::store::DocumentStore;

/// Annotation sets from an export payload, keyed by content hash.
pub type AggregatedAnnots = HashMap<String, PageAnnots>;

/// Group exported summaries by content hash, unioning their per-page
/// annotation sequences by concatenation in input order.
///
/// Entries with an empty hash or an empty annotation map are placeholder or
/// malformed rows in a hand-edited payload and contribute nothing. Several
/// summaries sharing one hash (duplicate copies of the same content exported
/// from different paths) merge transparently. No dedup happens here; the
/// document store's merge decides what is actually new.
pub fn aggregate(summaries: &[DocumentSummary]) -> AggregatedAnnots {
    let mut by_hash = AggregatedAnnots::new();
    for summary in summaries {
        if summary.hash.is_empty() || summary.annots.is_empty() {
            continue;
        }
        let pages = by_hash.entry(summary.hash.clone()).or_default();
        for (page, records) in &summary.annots {
            pages.entry(*page).or_default().extend(records.iter().cloned());
        }
    }
    by_hash
}

/// Walk `root` and build a summary for every readable document.
///
/// Export is best effort: a document that fails to open is skipped so one
/// corrupt file cannot abort the batch. Every opened document is closed
/// before the next one is touched.
pub fn export_all(
    store: &dyn DocumentStore,
    root: &Path,
) -> Result<Vec<DocumentSummary>, ScanError> {
    let paths = store.scan(root)?;

    let mut exported = Vec::new();
    for path in paths {
        let mut doc = match store.open(&path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable document");
                continue;
            }
        };
        exported.push(DocumentSummary {
            path: path.to_string_lossy().into_owned(),
            annots: doc.annotations(),
            hash: doc.content_hash(),
        });
        doc.close();
    }

    Ok(exported)
}

/// Merge aggregated annotations into every matching document under `root`.
///
/// The tree is re-scanned here rather than reusing any earlier scan, so the
/// import reflects what is on disk now. Each file is processed in isolation:
/// an open, merge, or save failure is recorded in that file's outcome and
/// never aborts the batch. Documents whose hash matches nothing in
/// `aggregated` are closed and left out of the summary entirely. The total
/// counts every recorded `imported`, including ones whose outcome also
/// carries an error.
pub fn import_into(
    store: &dyn DocumentStore,
    root: &Path,
    aggregated: &AggregatedAnnots,
) -> Result<ImportSummary, ScanError> {
    let paths = store.scan(root)?;

    let mut summary = ImportSummary::default();
    for path in paths {
        let mut outcome = ImportOutcome::new(&path.to_string_lossy());

        let mut doc = match store.open(&path) {
            Ok(doc) => doc,
            Err(e) => {
                outcome.error = Some(unpack_error(&e));
                summary.files.push(outcome);
                continue;
            }
        };

        let hash = doc.content_hash();
        let Some(annots) = aggregated.get(&hash) else {
            doc.close();
            continue;
        };

        let (imported, merge_err) = doc.merge(annots);
        outcome.imported = imported;
        if let Some(e) = merge_err {
            outcome.error = Some(unpack_error(&e));
            doc.close();
            summary.total_imported += imported;
            summary.files.push(outcome);
            continue;
        }

        if imported > 0 {
            match doc.persist() {
                Ok(()) => outcome.saved = true,
                Err(e) => outcome.error = Some(unpack_error(&e)),
            }
        }

        doc.close();
        summary.total_imported += imported;
        summary.files.push(outcome);
    }

    Ok(summary)
}
