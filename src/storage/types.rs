//! Domain types for storage layer
//!
//! These types are storage-agnostic - they don't know about SQLite or USearch.

use std::collections::BTreeMap;
use uuid::Uuid;

/// String-to-string metadata attached to every record
pub type Metadata = BTreeMap<String, String>;

/// Metadata key holding the indexed file's name (the join key for categories)
pub const META_FILENAME: &str = "filename";

/// Metadata key holding the full path of an indexed image
pub const META_PATH: &str = "path";

/// Metadata key holding the comma-joined categories chosen at ingestion
pub const META_CATEGORIES: &str = "categories";

/// An embedding plus metadata, written once and never updated
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
    /// Text excerpt kept for display and audit, never scored
    pub document: Option<String>,
}

impl IndexedRecord {
    /// New record with a fresh random id
    pub fn new(embedding: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            embedding,
            metadata,
            document: None,
        }
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }
}

/// One nearest-neighbor match, nearest first within a result list
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub metadata: Metadata,
    pub document: Option<String>,
    /// Cosine distance, lower is more similar
    pub distance: f32,
}

impl SearchHit {
    pub fn filename(&self) -> Option<&str> {
        self.metadata.get(META_FILENAME).map(String::as_str)
    }

    /// Categories recorded at ingestion time, empty for records without them
    pub fn categories(&self) -> Vec<&str> {
        self.metadata
            .get(META_CATEGORIES)
            .map(|joined| {
                joined
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_records_get_unique_ids() {
        let a = IndexedRecord::new(vec![1.0], Metadata::new());
        let b = IndexedRecord::new(vec![1.0], Metadata::new());
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn test_hit_categories() {
        let mut metadata = Metadata::new();
        metadata.insert(META_FILENAME.into(), "a.pdf".into());
        metadata.insert(META_CATEGORIES.into(), "ml, nlp,,".into());
        let hit = SearchHit {
            id: "1".into(),
            metadata,
            document: None,
            distance: 0.0,
        };
        assert_eq!(hit.filename(), Some("a.pdf"));
        assert_eq!(hit.categories(), vec!["ml", "nlp"]);

        let bare = SearchHit {
            metadata: Metadata::new(),
            ..hit
        };
        assert!(bare.categories().is_empty());
        assert_eq!(bare.filename(), None);
    }
}
