//! Persistent collection using SQLite + USearch hybrid approach
//!
//! SQLite stores the source of truth (record id, metadata, excerpt and the raw
//! embedding). USearch provides fast vector similarity search via an HNSW
//! index keyed by the SQLite rowid.

use super::types::{IndexedRecord, Metadata, SearchHit};
use super::{check_dimension, VectorStore};
use crate::error::AgentError;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

/// Capacity reserved when an index is created
const INITIAL_CAPACITY: usize = 1000;

/// Dual storage for one collection: SQLite + USearch
pub struct Collection {
    name: String,
    dimension: usize,
    vectors: Index,
    db: Connection,
    index_path: PathBuf,
}

impl Collection {
    /// Open or create a collection at the given path
    ///
    /// Creates two files:
    /// - `{path}/{name}.db` - SQLite database
    /// - `{path}/{name}.usearch` - USearch vector index
    ///
    /// The dimension is recorded on first open; reopening with another
    /// dimension fails so paper and image vectors can't end up mixed.
    pub fn open<P: AsRef<Path>>(path: P, name: &str, dimension: usize) -> Result<Self> {
        let base = path.as_ref();
        std::fs::create_dir_all(base)
            .with_context(|| format!("Failed to create store directory {}", base.display()))?;

        let db_path = base.join(format!("{name}.db"));
        let db = Connection::open(&db_path)
            .with_context(|| format!("Failed to open SQLite database {}", db_path.display()))?;

        Self::init_schema(&db)?;
        Self::check_stored_dimension(&db, name, dimension)?;

        let index_path = base.join(format!("{name}.usearch"));
        let vectors = new_index(dimension)?;
        if index_path.exists() {
            vectors
                .load(path_str(&index_path)?)
                .context("Failed to load existing USearch index")?;
        }

        let mut collection = Self {
            name: name.to_string(),
            dimension,
            vectors,
            db,
            index_path,
        };
        collection.sync_index()?;

        tracing::debug!(
            "Opened collection '{}' at {} ({} records)",
            name,
            base.display(),
            collection.vectors.size()
        );
        Ok(collection)
    }

    /// Initialize SQLite schema
    fn init_schema(db: &Connection) -> Result<()> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS records (
                rowid INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                metadata TEXT NOT NULL,
                document TEXT,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS collection_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn check_stored_dimension(db: &Connection, name: &str, dimension: usize) -> Result<()> {
        let stored = db.query_row(
            "SELECT value FROM collection_meta WHERE key = 'dimension'",
            [],
            |row| row.get::<_, String>(0),
        );

        match stored {
            Ok(value) => {
                let stored: usize = value
                    .parse()
                    .with_context(|| format!("Corrupt dimension entry '{value}'"))?;
                if stored != dimension {
                    return Err(AgentError::DimensionMismatch {
                        collection: name.to_string(),
                        stored,
                        requested: dimension,
                    }
                    .into());
                }
                Ok(())
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                db.execute(
                    "INSERT INTO collection_meta (key, value) VALUES ('dimension', ?1)",
                    params![dimension.to_string()],
                )?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rebuild the vector index from SQLite when the two disagree
    /// (index file lost, or a crash between insert and save)
    fn sync_index(&mut self) -> Result<()> {
        let count = self.count()?;
        if self.vectors.size() == count {
            return Ok(());
        }

        tracing::warn!(
            "Index for '{}' holds {} vectors but {} records exist, rebuilding",
            self.name,
            self.vectors.size(),
            count
        );

        let rebuilt = new_index(self.dimension)?;
        rebuilt.reserve(count.max(INITIAL_CAPACITY))?;

        let mut stmt = self.db.prepare("SELECT rowid, embedding FROM records")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);

        for (rowid, blob) in rows {
            let embedding = bytes_to_vec_f32(&blob)?;
            rebuilt
                .add(rowid as u64, &embedding)
                .context("Failed to add vector to USearch index")?;
        }

        self.vectors = rebuilt;
        self.save_index()
    }

    /// Save USearch index to disk
    pub fn save_index(&self) -> Result<()> {
        self.vectors
            .save(path_str(&self.index_path)?)
            .context("Failed to save USearch index")?;
        Ok(())
    }

    /// Load a hit by rowid from SQLite
    fn load_by_rowid(&self, rowid: i64, distance: f32) -> Result<Option<SearchHit>> {
        let result = self.db.query_row(
            "SELECT id, metadata, document FROM records WHERE rowid = ?1",
            params![rowid],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        );

        match result {
            Ok((id, metadata_json, document)) => {
                let metadata: Metadata = serde_json::from_str(&metadata_json)
                    .with_context(|| format!("Corrupt metadata for record {id}"))?;
                Ok(Some(SearchHit {
                    id,
                    metadata,
                    document,
                    distance,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl VectorStore for Collection {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .db
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Insert into SQLite and USearch in one step
    ///
    /// The SQLite row is rolled back if the vector can't be indexed.
    fn add(&mut self, record: &IndexedRecord) -> Result<()> {
        check_dimension(&self.name, self.dimension, &record.embedding)?;

        let metadata_json = serde_json::to_string(&record.metadata)?;
        let blob = vec_f32_to_bytes(&record.embedding);
        let created_at = chrono::Utc::now().to_rfc3339();

        let tx = self.db.transaction()?;
        let rowid: i64 = tx
            .query_row(
                "INSERT INTO records (id, metadata, document, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING rowid",
                params![
                    &record.id,
                    metadata_json,
                    record.document.as_deref(),
                    blob,
                    created_at,
                ],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to insert record {}", record.id))?;

        if self.vectors.size() >= self.vectors.capacity() {
            let grown = (self.vectors.capacity() * 2).max(INITIAL_CAPACITY);
            self.vectors
                .reserve(grown)
                .context("Failed to grow USearch index")?;
        }
        self.vectors
            .add(rowid as u64, &record.embedding)
            .context("Failed to add vector to USearch index")?;

        tx.commit()?;
        Ok(())
    }

    fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        check_dimension(&self.name, self.dimension, embedding)?;
        if k == 0 || self.vectors.size() == 0 {
            return Ok(Vec::new());
        }

        let matches = self
            .vectors
            .search(embedding, k)
            .context("Failed to search USearch index")?;

        let mut hits = Vec::with_capacity(matches.keys.len());
        for (rowid, distance) in matches.keys.iter().zip(matches.distances.iter()) {
            if let Some(hit) = self.load_by_rowid(*rowid as i64, *distance)? {
                hits.push(hit);
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }

    fn flush(&mut self) -> Result<()> {
        self.save_index()
    }
}

fn new_index(dimension: usize) -> Result<Index> {
    let options = IndexOptions {
        dimensions: dimension,
        metric: MetricKind::Cos, // Cosine distance, 0 = same direction
        quantization: ScalarKind::F32,
        ..Default::default()
    };

    let index = Index::new(&options).context("Failed to create USearch index")?;
    index
        .reserve(INITIAL_CAPACITY)
        .context("Failed to reserve USearch capacity")?;
    Ok(index)
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("Index path is not valid UTF-8: {}", path.display()))
}

/// Convert f32 vector to bytes for SQLite blob
pub fn vec_f32_to_bytes(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|&f| f.to_le_bytes()).collect()
}

/// Convert SQLite blob back to an f32 vector
pub fn bytes_to_vec_f32(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        bail!("Embedding blob length {} is not a multiple of 4", bytes.len());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::META_FILENAME;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn record(filename: &str, embedding: Vec<f32>) -> IndexedRecord {
        let mut metadata = Metadata::new();
        metadata.insert(META_FILENAME.to_string(), filename.to_string());
        IndexedRecord::new(embedding, metadata)
    }

    #[test]
    fn test_collection_creation() -> Result<()> {
        let temp = TempDir::new()?;
        let collection = Collection::open(temp.path(), "papers", 4)?;
        assert_eq!(collection.count()?, 0);
        assert_eq!(collection.dimension(), 4);
        assert!(collection.query(&[1.0, 0.0, 0.0, 0.0], 3)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_collection_roundtrip() -> Result<()> {
        let temp = TempDir::new()?;
        let mut collection = Collection::open(temp.path(), "papers", 4)?;

        let paper = record("attention.pdf", vec![1.0, 0.0, 0.0, 0.0])
            .with_document("Attention is all you need");
        collection.add(&paper)?;
        collection.flush()?;

        assert_eq!(collection.count()?, 1);

        let hits = collection.query(&paper.embedding, 3)?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, paper.id);
        assert_eq!(hits[0].filename(), Some("attention.pdf"));
        assert_eq!(hits[0].document.as_deref(), Some("Attention is all you need"));
        assert_relative_eq!(hits[0].distance, 0.0, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn test_query_orders_nearest_first() -> Result<()> {
        let temp = TempDir::new()?;
        let mut collection = Collection::open(temp.path(), "papers", 4)?;
        collection.add(&record("far.pdf", vec![0.0, 1.0, 0.0, 0.0]))?;
        collection.add(&record("near.pdf", vec![1.0, 0.0, 0.0, 0.0]))?;
        collection.add(&record("mid.pdf", vec![0.8, 0.6, 0.0, 0.0]))?;

        let hits = collection.query(&[1.0, 0.0, 0.0, 0.0], 3)?;
        let names: Vec<_> = hits.iter().filter_map(|h| h.filename()).collect();
        assert_eq!(names, vec!["near.pdf", "mid.pdf", "far.pdf"]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

        let top1 = collection.query(&[1.0, 0.0, 0.0, 0.0], 1)?;
        assert_eq!(top1.len(), 1);
        assert_eq!(top1[0].filename(), Some("near.pdf"));
        Ok(())
    }

    #[test]
    fn test_reopen_preserves_records() -> Result<()> {
        let temp = TempDir::new()?;
        {
            let mut collection = Collection::open(temp.path(), "images", 4)?;
            collection.add(&record("cat.png", vec![0.0, 0.0, 1.0, 0.0]))?;
            collection.flush()?;
        }

        let collection = Collection::open(temp.path(), "images", 4)?;
        assert_eq!(collection.count()?, 1);
        let hits = collection.query(&[0.0, 0.0, 1.0, 0.0], 3)?;
        assert_eq!(hits[0].filename(), Some("cat.png"));
        Ok(())
    }

    #[test]
    fn test_lost_index_is_rebuilt() -> Result<()> {
        let temp = TempDir::new()?;
        {
            let mut collection = Collection::open(temp.path(), "papers", 4)?;
            collection.add(&record("a.pdf", vec![1.0, 0.0, 0.0, 0.0]))?;
            collection.add(&record("b.pdf", vec![0.0, 1.0, 0.0, 0.0]))?;
            // No flush: the index file never reaches disk
        }
        assert!(!temp.path().join("papers.usearch").exists());

        let collection = Collection::open(temp.path(), "papers", 4)?;
        assert_eq!(collection.count()?, 2);
        let hits = collection.query(&[0.0, 1.0, 0.0, 0.0], 1)?;
        assert_eq!(hits[0].filename(), Some("b.pdf"));
        assert!(temp.path().join("papers.usearch").exists());
        Ok(())
    }

    #[test]
    fn test_dimension_mismatch_on_reopen() -> Result<()> {
        let temp = TempDir::new()?;
        drop(Collection::open(temp.path(), "papers", 4)?);

        let err = Collection::open(temp.path(), "papers", 8).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::DimensionMismatch {
                stored: 4,
                requested: 8,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_wrong_length_embedding_rejected() -> Result<()> {
        let temp = TempDir::new()?;
        let mut collection = Collection::open(temp.path(), "papers", 4)?;
        assert!(collection.add(&record("a.pdf", vec![1.0, 0.0])).is_err());
        assert!(collection.query(&[1.0, 0.0], 1).is_err());
        assert_eq!(collection.count()?, 0);
        Ok(())
    }

    #[test]
    fn test_duplicate_id_rejected() -> Result<()> {
        let temp = TempDir::new()?;
        let mut collection = Collection::open(temp.path(), "papers", 4)?;
        let paper = record("a.pdf", vec![1.0, 0.0, 0.0, 0.0]);
        collection.add(&paper)?;
        assert!(collection.add(&paper).is_err());
        assert_eq!(collection.count()?, 1);
        Ok(())
    }

    #[test]
    fn test_grows_past_initial_capacity() -> Result<()> {
        let temp = TempDir::new()?;
        let mut collection = Collection::open(temp.path(), "papers", 2)?;
        for i in 0..(INITIAL_CAPACITY + 5) {
            let angle = i as f32 * 0.001;
            collection.add(&record(&format!("{i}.pdf"), vec![angle.cos(), angle.sin()]))?;
        }
        assert_eq!(collection.count()?, INITIAL_CAPACITY + 5);
        Ok(())
    }

    #[test]
    fn test_vec_f32_bytes_roundtrip() -> Result<()> {
        let vec = vec![1.0, 2.5, -3.25];
        let bytes = vec_f32_to_bytes(&vec);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_vec_f32(&bytes)?, vec);
        assert!(bytes_to_vec_f32(&bytes[..5]).is_err());
        Ok(())
    }
}
