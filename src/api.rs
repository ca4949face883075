use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Annotation records keyed by page number, append-ordered within a page.
pub type PageAnnots = BTreeMap<u32, Vec<Value>>;

/// One exported document: its path at export time, its per-page annotation
/// records, and the content hash used as its identity everywhere else.
/// Two summaries with the same `hash` are the same logical document no
/// matter what their paths say.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub path: String,
    #[serde(default)]
    pub annots: PageAnnots,
    #[serde(default)]
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub file: String,
    pub imported: usize,
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportOutcome {
    pub fn new(file: &str) -> Self {
        ImportOutcome {
            file: file.to_owned(),
            imported: 0,
            saved: false,
            error: None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub files: Vec<ImportOutcome>,
    #[serde(rename = "totalImported")]
    pub total_imported: usize,
}
