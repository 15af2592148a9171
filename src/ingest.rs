//! Ingestion - adding papers and building the image index
//!
//! A paper is indexed once per `add_paper` call and copied into every topic
//! directory it was filed under. Images are indexed in bulk the first time an
//! image search runs against an empty collection.

use crate::embeddings::{EmbeddingEngine, ImageEmbeddingEngine};
use crate::error::{AgentError, Collaborator, CollaboratorResultExt};
use crate::extract::{excerpt, is_supported_document, list_images, TextExtractor};
use crate::paths::{Layout, UNKNOWN_CATEGORY};
use crate::storage::{IndexedRecord, Metadata, VectorStore, META_CATEGORIES, META_FILENAME, META_PATH};
use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Split a comma-separated topic list
///
/// Entries are trimmed, empties dropped and duplicates removed (first
/// occurrence wins). An empty list means [`UNKNOWN_CATEGORY`]. Each topic
/// becomes a directory name, so anything that isn't a single plain path
/// component is rejected.
///
/// ```
/// use papyrus::ingest::parse_topics;
///
/// assert_eq!(parse_topics(" ml, nlp ,ml").unwrap(), vec!["ml", "nlp"]);
/// assert_eq!(parse_topics("").unwrap(), vec!["unknown"]);
/// assert!(parse_topics("../etc").is_err());
/// ```
pub fn parse_topics(raw: &str) -> Result<Vec<String>> {
    normalize_topics(raw.split(','))
}

/// Trim, dedup and validate topic names; an empty result becomes [`UNKNOWN_CATEGORY`]
pub fn normalize_topics<I, S>(topics: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();

    for topic in topics {
        let topic = topic.as_ref().trim();
        if topic.is_empty() {
            continue;
        }

        let mut components = Path::new(topic).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal || topic.contains(['/', '\\', ',']) {
            return Err(AgentError::InvalidTopic(topic.to_string()).into());
        }

        if !normalized.iter().any(|t| t == topic) {
            normalized.push(topic.to_string());
        }
    }

    if normalized.is_empty() {
        normalized.push(UNKNOWN_CATEGORY.to_string());
    }
    Ok(normalized)
}

/// Reject inputs that can never be ingested, without loading any model
pub fn validate_paper(paper: &Path) -> Result<()> {
    if !is_supported_document(paper) {
        return Err(AgentError::UnsupportedFormat(paper.to_path_buf()).into());
    }
    if !paper.is_file() {
        return Err(AgentError::MissingInput(paper.to_path_buf()).into());
    }
    Ok(())
}

/// Result of adding one paper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperIngest {
    /// Record id in the paper collection
    pub id: String,
    pub filename: String,
    pub topics: Vec<String>,
    /// Where the paper now lives, one path per topic
    pub copies: Vec<PathBuf>,
}

/// Index a paper and file it under its topics
///
/// Topics go through [`normalize_topics`], so an empty list files the paper
/// under `unknown` and path-like names are rejected before anything is
/// written. Order matters: the record is written before any copy is made, so a failed
/// copy leaves the paper searchable rather than filed but unindexed.
pub fn ingest_paper(
    paper: &Path,
    topics: &[String],
    extractor: &dyn TextExtractor,
    embedder: &mut dyn EmbeddingEngine,
    store: &mut dyn VectorStore,
    layout: &Layout,
    excerpt_chars: usize,
) -> Result<PaperIngest> {
    validate_paper(paper)?;
    let topics = normalize_topics(topics)?;

    let filename = paper
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| AgentError::UnsupportedFormat(paper.to_path_buf()))?;

    let text = extractor.extract(paper).via(Collaborator::TextExtractor)?;
    if text.trim().is_empty() {
        tracing::warn!("No text extracted from {}, indexing an empty document", filename);
    }

    let embedding = embedder
        .embed_passage(&text)
        .via(Collaborator::TextEncoder)?;

    let mut metadata = Metadata::new();
    metadata.insert(META_FILENAME.to_string(), filename.clone());
    metadata.insert(META_CATEGORIES.to_string(), topics.join(","));

    let record = IndexedRecord::new(embedding, metadata).with_document(excerpt(&text, excerpt_chars));
    store.add(&record).via(Collaborator::VectorStore)?;
    store.flush().via(Collaborator::VectorStore)?;
    tracing::info!("Indexed {} as {}", filename, record.id);

    let mut copies = Vec::with_capacity(topics.len());
    for topic in &topics {
        let dir = layout.category_dir(topic);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create category directory {}", dir.display()))?;

        let target = dir.join(&filename);
        if same_file(paper, &target) {
            tracing::debug!("{} already lives in {}", filename, dir.display());
        } else {
            std::fs::copy(paper, &target).with_context(|| {
                format!("Failed to copy {} to {}", paper.display(), target.display())
            })?;
        }
        copies.push(target);
    }

    Ok(PaperIngest {
        id: record.id,
        filename,
        topics,
        copies,
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// What [`ensure_image_index`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageIndexStatus {
    /// Collection was already populated; nothing was encoded
    AlreadyIndexed { count: usize },
    /// Collection was empty and has been built from the image root
    Built {
        indexed: usize,
        /// Images that could not be decoded
        skipped: Vec<PathBuf>,
    },
}

/// Build the image collection from everything under `images_root` if it is empty
pub fn ensure_image_index(
    images_root: &Path,
    embedder: &mut dyn ImageEmbeddingEngine,
    store: &mut dyn VectorStore,
) -> Result<ImageIndexStatus> {
    ensure_image_index_from(list_images(images_root), embedder, store)
}

/// Build the image collection from an already discovered image list if it is empty
///
/// Populated collections are left alone, even if new images appeared on disk.
/// All images are encoded before anything is written, so an encoder failure
/// never leaves a half-built collection behind.
pub fn ensure_image_index_from(
    images: Vec<PathBuf>,
    embedder: &mut dyn ImageEmbeddingEngine,
    store: &mut dyn VectorStore,
) -> Result<ImageIndexStatus> {
    let count = store.count().via(Collaborator::VectorStore)?;
    if count > 0 {
        return Ok(ImageIndexStatus::AlreadyIndexed { count });
    }

    tracing::info!("Indexing {} images", images.len());

    let mut records = Vec::with_capacity(images.len());
    let mut skipped = Vec::new();
    for path in images {
        match embedder.embed_image(&path) {
            Ok(embedding) => {
                let mut metadata = Metadata::new();
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                metadata.insert(META_FILENAME.to_string(), filename);
                metadata.insert(META_PATH.to_string(), path.display().to_string());
                records.push(IndexedRecord::new(embedding, metadata));
            }
            Err(e) if is_decode_failure(&e) => {
                tracing::warn!("Skipping {}: {:#}", path.display(), e);
                skipped.push(path);
            }
            Err(e) => return Err(e).via(Collaborator::ImageEncoder),
        }
    }

    for record in &records {
        store.add(record).via(Collaborator::VectorStore)?;
    }
    store.flush().via(Collaborator::VectorStore)?;

    Ok(ImageIndexStatus::Built {
        indexed: records.len(),
        skipped,
    })
}

/// Bad image files are per-item problems; everything else is the encoder's
fn is_decode_failure(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<image::ImageError>().is_some()
            || cause.downcast_ref::<std::io::Error>().is_some()
    })
}
