//! Indexed document types.
//!
//! A `Document` is one entry of the seed corpus: immutable once indexed,
//! identified by its source filename. A `Hit` is what retrieval returns —
//! the document's stored fields merged with a similarity score.

use serde::{Deserialize, Serialize};

/// A single corpus document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique ID (the source filename during corpus loading)
    pub id: String,

    /// The document text that gets embedded
    pub text: String,

    /// Arbitrary metadata attached at index-build time
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Create a document with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            meta: serde_json::Map::new(),
        }
    }
}

/// A retrieval hit: similarity score plus the matched document's fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    /// Inner-product similarity against the query (vectors are
    /// L2-normalized, so this approximates cosine similarity)
    pub score: f32,

    #[serde(flatten)]
    pub document: Document,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_serialization_skips_empty_meta() {
        let doc = Document::new("faq.txt", "How do refunds work?");
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("faq.txt"));
        assert!(!json.contains("meta"));
    }

    #[test]
    fn hit_flattens_document_fields() {
        let hit = Hit {
            score: 0.83,
            document: Document::new("a.txt", "espresso"),
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["id"], "a.txt");
        assert_eq!(json["text"], "espresso");
        assert!((json["score"].as_f64().unwrap() - 0.83).abs() < 1e-6);
    }

    #[test]
    fn document_meta_roundtrips() {
        let mut doc = Document::new("promo.txt", "Winter sale");
        doc.meta
            .insert("src".into(), serde_json::json!("promo.txt"));
        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.meta["src"], "promo.txt");
    }
}
