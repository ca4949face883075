//! lopdf-backed document store.
//!
//! Annotation records are stored inside the PDF as `/Annot` dictionaries
//! marked with a `/Marginalia` flag, the record JSON in `/Contents`. The
//! content hash covers the page content streams only, so importing
//! annotations never changes a document's identity.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Object, ObjectId, StringFormat, dictionary};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::api::PageAnnots;
use crate::error::{MergeError, OpenError, SaveError, ScanError};
use crate::scanner;
use crate::store::{Document, DocumentStore};

const MARKER: &[u8] = b"Marginalia";

#[derive(Debug, Default, Clone)]
pub struct PdfStore;

impl PdfStore {
    pub fn new() -> Self {
        PdfStore
    }
}

impl DocumentStore for PdfStore {
    fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        scanner::scan(root)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Document>, OpenError> {
        let doc = lopdf::Document::load(path).map_err(|e| OpenError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(PdfDocument {
            doc,
            path: path.to_path_buf(),
        }))
    }
}

pub struct PdfDocument {
    doc: lopdf::Document,
    path: PathBuf,
}

impl PdfDocument {
    /// Serialized record JSON of every marked annotation on a page.
    fn page_records(&self, page_id: ObjectId) -> Vec<String> {
        let mut records = Vec::new();
        let Ok(page) = self.doc.get_dictionary(page_id) else {
            return records;
        };
        let Ok(annots) = page.get(b"Annots") else {
            return records;
        };
        let annots = match annots {
            Object::Reference(id) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items,
                _ => return records,
            },
            Object::Array(items) => items,
            _ => return records,
        };
        for item in annots {
            let dict = match item {
                Object::Reference(id) => match self.doc.get_object(*id) {
                    Ok(Object::Dictionary(dict)) => dict,
                    _ => continue,
                },
                Object::Dictionary(dict) => dict,
                _ => continue,
            };
            if dict.get(MARKER).is_err() {
                continue;
            }
            if let Ok(Object::String(bytes, _)) = dict.get(b"Contents") {
                records.push(String::from_utf8_lossy(bytes).into_owned());
            }
        }
        records
    }

    fn annotation_object(text: &str) -> Dictionary {
        dictionary! {
            "Type" => "Annot",
            "Subtype" => "Text",
            "Rect" => vec![0.into(), 0.into(), 0.into(), 0.into()],
            "Contents" => Object::String(text.as_bytes().to_vec(), StringFormat::Literal),
            "Marginalia" => true,
        }
    }

    /// Append annotation references to a page's `/Annots`, creating the
    /// array when the page has none yet.
    fn push_annots(&mut self, page_id: ObjectId, ids: Vec<ObjectId>) -> Result<(), MergeError> {
        let refs: Vec<Object> = ids.into_iter().map(Object::Reference).collect();

        let page = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| MergeError(format!("page dictionary: {e}")))?;
        let indirect_array = match page.get(b"Annots") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };

        if let Some(array_id) = indirect_array {
            match self
                .doc
                .get_object_mut(array_id)
                .map_err(|e| MergeError(format!("annots array: {e}")))?
            {
                Object::Array(items) => items.extend(refs),
                _ => return Err(MergeError("annots is not an array".into())),
            }
            return Ok(());
        }

        let page = self
            .doc
            .get_dictionary_mut(page_id)
            .map_err(|e| MergeError(format!("page dictionary: {e}")))?;
        match page.get_mut(b"Annots") {
            Ok(Object::Array(items)) => items.extend(refs),
            _ => page.set("Annots", Object::Array(refs)),
        }
        Ok(())
    }
}

impl Document for PdfDocument {
    fn annotations(&self) -> PageAnnots {
        let mut annots = PageAnnots::new();
        for (page_no, page_id) in self.doc.get_pages() {
            let records: Vec<Value> = self
                .page_records(page_id)
                .into_iter()
                .map(|text| serde_json::from_str(&text).unwrap_or(Value::String(text)))
                .collect();
            if !records.is_empty() {
                annots.insert(page_no, records);
            }
        }
        annots
    }

    fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for (_, page_id) in self.doc.get_pages() {
            if let Ok(content) = self.doc.get_page_content(page_id) {
                hasher.update(&content);
            }
        }
        hex::encode(hasher.finalize())
    }

    fn merge(&mut self, incoming: &PageAnnots) -> (usize, Option<MergeError>) {
        let pages = self.doc.get_pages();
        let mut applied = 0;

        for (page_no, records) in incoming {
            // Records addressed to pages this document does not have are
            // skipped, not errors: page counts can drift between copies.
            let Some(&page_id) = pages.get(page_no) else {
                continue;
            };
            let mut existing: HashSet<String> = self.page_records(page_id).into_iter().collect();
            let mut fresh = Vec::new();
            for record in records {
                let text = record.to_string();
                if !existing.insert(text.clone()) {
                    continue;
                }
                fresh.push(self.doc.add_object(Self::annotation_object(&text)));
            }
            if fresh.is_empty() {
                continue;
            }
            let count = fresh.len();
            if let Err(e) = self.push_annots(page_id, fresh) {
                return (applied, Some(e));
            }
            applied += count;
        }

        (applied, None)
    }

    fn persist(&mut self) -> Result<(), SaveError> {
        self.doc
            .save(&self.path)
            .map(|_| ())
            .map_err(|e| SaveError(e.to_string()))
    }

    fn close(&mut self) {}
}
