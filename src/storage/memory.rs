//! In-memory collection with exact (brute force) search
//!
//! Same contract as [`super::Collection`] without persistence. Used for
//! scratch runs and for exercising the orchestrators without touching disk.

use super::types::{IndexedRecord, SearchHit};
use super::{check_dimension, VectorStore};
use crate::embeddings::cosine_similarity;
use anyhow::{bail, Result};

pub struct MemoryCollection {
    name: String,
    dimension: usize,
    records: Vec<IndexedRecord>,
}

impl MemoryCollection {
    pub fn new(name: &str, dimension: usize) -> Self {
        Self {
            name: name.to_string(),
            dimension,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[IndexedRecord] {
        &self.records
    }
}

impl VectorStore for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }

    fn add(&mut self, record: &IndexedRecord) -> Result<()> {
        check_dimension(&self.name, self.dimension, &record.embedding)?;
        if self.records.iter().any(|r| r.id == record.id) {
            bail!("Record {} already exists in '{}'", record.id, self.name);
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        check_dimension(&self.name, self.dimension, embedding)?;

        let mut hits: Vec<SearchHit> = self
            .records
            .iter()
            .map(|r| SearchHit {
                id: r.id.clone(),
                metadata: r.metadata.clone(),
                document: r.document.clone(),
                distance: 1.0 - cosine_similarity(embedding, &r.embedding),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }
}
