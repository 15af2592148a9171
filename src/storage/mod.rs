//! Vector storage - SQLite + USearch hybrid collections
//!
//! Each collection owns both backends:
//! - SQLite for the records themselves (id, metadata, excerpt, raw embedding)
//! - USearch for nearest-neighbor search (HNSW, cosine metric)
//!
//! Papers and images live in separate collections with their own dimension;
//! they are never queried together.
//!
//! # Example
//!
//! ```no_run
//! use papyrus::storage::{Collection, IndexedRecord, Metadata, VectorStore};
//!
//! let mut papers = Collection::open("index/paper_db", "papers", 384)?;
//! papers.add(&IndexedRecord::new(vec![0.1; 384], Metadata::new()))?;
//! papers.flush()?;
//! let hits = papers.query(&vec![0.1; 384], 3)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod collection;
mod memory;
pub mod types;

pub use collection::Collection;
pub use memory::MemoryCollection;
pub use types::{
    IndexedRecord, Metadata, SearchHit, META_CATEGORIES, META_FILENAME, META_PATH,
};

use anyhow::Result;

/// Capability the orchestrators need from a vector collection
pub trait VectorStore {
    /// Collection name (used in messages)
    fn name(&self) -> &str;

    /// Dimension every stored and queried embedding must have
    fn dimension(&self) -> usize;

    /// Number of records in the collection
    fn count(&self) -> Result<usize>;

    /// Insert a record. Ids are unique; re-adding an id is an error.
    fn add(&mut self, record: &IndexedRecord) -> Result<()>;

    /// Up to `k` nearest records, ascending by distance
    fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchHit>>;

    /// Make everything added so far durable
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Reject embeddings whose length doesn't match the collection
pub(crate) fn check_dimension(store_name: &str, expected: usize, embedding: &[f32]) -> Result<()> {
    if embedding.len() != expected {
        return Err(crate::error::AgentError::DimensionMismatch {
            collection: store_name.to_string(),
            stored: expected,
            requested: embedding.len(),
        }
        .into());
    }
    Ok(())
}
