//! Seed corpus loading.
//!
//! Every `.txt` file in the corpus directory becomes one document whose
//! identity is the filename. Files are visited in filename order so
//! repeated builds index identical corpora identically.

use std::path::Path;

use shopclerk_core::{Document, IndexError};
use tracing::debug;

/// Load all `.txt` files under `dir` as documents.
///
/// Non-`.txt` entries are ignored. An unreadable directory or file is an
/// error — a partially loaded corpus would silently index the wrong
/// content.
pub fn load_seed_docs(dir: impl AsRef<Path>) -> Result<Vec<Document>, IndexError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir)
        .map_err(|e| IndexError::Corpus(format!("read corpus dir {dir:?}: {e}")))?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let text = std::fs::read_to_string(&path)
            .map_err(|e| IndexError::Corpus(format!("read {path:?}: {e}")))?;

        let mut doc = Document::new(name.clone(), text.trim().to_string());
        doc.meta.insert("src".into(), serde_json::json!(name));
        docs.push(doc);
    }

    debug!(dir = %dir.display(), docs = docs.len(), "seed corpus loaded");
    Ok(docs)
}
