//! Similarity search over a collection, scored as relevance percentages
//!
//! Both search paths share one flow: embed the query, take the top-k nearest
//! records, turn their distances into percentages with the relevance scorer
//! and number the results from 1. Searching never writes to the store.

use crate::config::SearchConfig;
use crate::embeddings::{EmbeddingEngine, ImageEmbeddingEngine};
use crate::error::{Collaborator, CollaboratorResultExt};
use crate::scoring::{relevance_percentages, DEFAULT_TEMPERATURE};
use crate::storage::{SearchHit, VectorStore};
use anyhow::Result;
use std::fmt;

/// How many results to fetch and how sharply to score them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub top_k: usize,
    pub temperature: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 3,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            top_k: config.top_k,
            temperature: config.temperature,
        }
    }
}

/// One scored result
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    /// 1-indexed position
    pub rank: usize,
    pub hit: SearchHit,
    /// Share of the result list's relevance, in percent
    pub relevance: f64,
}

impl RankedEntry {
    /// Display name: the indexed filename, or the record id if it has none
    pub fn label(&self) -> &str {
        self.hit.filename().unwrap_or(&self.hit.id)
    }
}

impl fmt::Display for RankedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. {} | relevance={:.2}%",
            self.rank,
            self.label(),
            self.relevance
        )
    }
}

/// Non-empty, nearest-first result list with percentages summing to 100
#[derive(Debug, Clone, PartialEq)]
pub struct RankedList {
    entries: Vec<RankedEntry>,
}

impl RankedList {
    /// Score hits (ascending by distance) into a ranked list; `None` if there are none
    pub fn from_hits(hits: Vec<SearchHit>, temperature: f64) -> Result<Option<Self>> {
        if hits.is_empty() {
            return Ok(None);
        }

        let distances: Vec<f32> = hits.iter().map(|h| h.distance).collect();
        let percentages = relevance_percentages(&distances, temperature)?;

        let entries = hits
            .into_iter()
            .zip(percentages)
            .enumerate()
            .map(|(i, (hit, relevance))| RankedEntry {
                rank: i + 1,
                hit,
                relevance,
            })
            .collect();

        Ok(Some(Self { entries }))
    }

    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }

    /// Rendered lines, one per entry
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

/// What a search produced
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Nothing has been indexed yet
    EmptyStore,
    /// The store returned no candidates
    NoMatches,
    Ranked(RankedList),
}

/// Rank the store's nearest neighbors of an already computed query embedding
pub fn search_by_embedding(
    embedding: &[f32],
    store: &dyn VectorStore,
    options: &SearchOptions,
) -> Result<SearchOutcome> {
    let hits = store
        .query(embedding, options.top_k)
        .via(Collaborator::VectorStore)?;

    tracing::debug!(
        "Query against '{}' returned {} of {} requested",
        store.name(),
        hits.len(),
        options.top_k
    );

    Ok(match RankedList::from_hits(hits, options.temperature)? {
        Some(list) => SearchOutcome::Ranked(list),
        None => SearchOutcome::NoMatches,
    })
}

/// Search indexed papers with a free-text query
///
/// # Example
/// ```no_run
/// use papyrus::embeddings::create_text_embedder;
/// use papyrus::query::{search_papers, SearchOptions, SearchOutcome};
/// use papyrus::storage::Collection;
/// use papyrus::Config;
///
/// let config = Config::default();
/// let mut embedder = create_text_embedder(&config.models)?;
/// let store = Collection::open("index/paper_db", "papers", embedder.dimension())?;
///
/// if let SearchOutcome::Ranked(list) =
///     search_papers("attention mechanisms", &mut *embedder, &store, &SearchOptions::default())?
/// {
///     for line in list.lines() {
///         println!("{}", line);
///     }
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn search_papers(
    query: &str,
    embedder: &mut dyn EmbeddingEngine,
    store: &dyn VectorStore,
    options: &SearchOptions,
) -> Result<SearchOutcome> {
    if store.count().via(Collaborator::VectorStore)? == 0 {
        return Ok(SearchOutcome::EmptyStore);
    }

    let embedding = embedder
        .embed_query(query)
        .via(Collaborator::TextEncoder)?;
    search_by_embedding(&embedding, store, options)
}

/// Search indexed images with a free-text query (joint text/image space)
pub fn search_images(
    query: &str,
    embedder: &mut dyn ImageEmbeddingEngine,
    store: &dyn VectorStore,
    options: &SearchOptions,
) -> Result<SearchOutcome> {
    if store.count().via(Collaborator::VectorStore)? == 0 {
        return Ok(SearchOutcome::EmptyStore);
    }

    let embedding = embedder
        .embed_text(query)
        .via(Collaborator::ImageEncoder)?;
    search_by_embedding(&embedding, store, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Metadata, META_FILENAME};
    use approx::assert_relative_eq;

    fn hit(filename: &str, distance: f32) -> SearchHit {
        let mut metadata = Metadata::new();
        metadata.insert(META_FILENAME.to_string(), filename.to_string());
        SearchHit {
            id: format!("id-{filename}"),
            metadata,
            document: None,
            distance,
        }
    }

    #[test]
    fn test_from_hits_numbers_from_one() -> Result<()> {
        let list = RankedList::from_hits(
            vec![hit("a.pdf", 0.1), hit("b.pdf", 0.3), hit("c.pdf", 0.8)],
            0.5,
        )?
        .unwrap();

        assert_eq!(list.len(), 3);
        let ranks: Vec<usize> = list.entries().iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(list.best().unwrap().label(), "a.pdf");

        let total: f64 = list.entries().iter().map(|e| e.relevance).sum();
        assert_relative_eq!(total, 100.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_from_hits_empty_is_none() -> Result<()> {
        assert!(RankedList::from_hits(Vec::new(), 0.5)?.is_none());
        Ok(())
    }

    #[test]
    fn test_render_format() -> Result<()> {
        let list = RankedList::from_hits(vec![hit("only.pdf", 0.2)], 0.5)?.unwrap();
        assert_eq!(list.lines(), vec!["1. only.pdf | relevance=100.00%"]);
        Ok(())
    }

    #[test]
    fn test_label_falls_back_to_id() -> Result<()> {
        let bare = SearchHit {
            id: "rec-1".into(),
            metadata: Metadata::new(),
            document: None,
            distance: 0.0,
        };
        let list = RankedList::from_hits(vec![bare], 0.5)?.unwrap();
        assert_eq!(list.entries()[0].label(), "rec-1");
        Ok(())
    }

    #[test]
    fn test_options_from_config() {
        let config = SearchConfig {
            top_k: 7,
            temperature: 0.2,
            excerpt_chars: 10,
        };
        assert_eq!(
            SearchOptions::from(&config),
            SearchOptions {
                top_k: 7,
                temperature: 0.2
            }
        );
    }
}
