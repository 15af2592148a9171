//! Batch classification of unfiled papers
//!
//! Every PDF waiting in `unknown/` is embedded and matched against the paper
//! collection. The single nearest indexed paper decides where it goes: the
//! categories recorded when that paper was added win, otherwise the first
//! category directory (by name) that holds a file of the same name.

use crate::embeddings::EmbeddingEngine;
use crate::error::{Collaborator, CollaboratorResultExt};
use crate::extract::TextExtractor;
use crate::paths::{Category, Layout, UNKNOWN_CATEGORY};
use crate::storage::{SearchHit, VectorStore};
use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

/// First category (categories must be sorted by name) holding `filename`
pub fn resolve_by_filename<'a>(filename: &str, categories: &'a [Category]) -> Option<&'a Category> {
    categories.iter().find(|c| c.contains(filename))
}

/// Category a nearest-neighbor hit points to
///
/// The first existing category (by name) among those stored on the hit wins;
/// `unknown` never does. Hits without a usable stored category fall back to
/// [`resolve_by_filename`].
pub fn resolve_category<'a>(hit: &SearchHit, categories: &'a [Category]) -> Option<&'a Category> {
    let stored = hit.categories();
    let recorded = categories
        .iter()
        .filter(|c| c.name != UNKNOWN_CATEGORY)
        .find(|c| stored.contains(&c.name.as_str()));

    recorded.or_else(|| hit.filename().and_then(|f| resolve_by_filename(f, categories)))
}

/// Why a paper stayed in `unknown/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Nearest paper isn't filed in any category
    NoMatchingCategory,
    /// The store returned nothing
    NoIndexedMatch,
    /// Text could not be extracted
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoMatchingCategory => f.write_str("no matching category"),
            SkipReason::NoIndexedMatch => f.write_str("no indexed paper to compare against"),
            SkipReason::Unreadable(reason) => write!(f, "unreadable ({})", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyOutcome {
    Moved { file: String, category: String },
    Skipped { file: String, reason: SkipReason },
}

/// Per-file outcomes of one run, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyReport {
    pub outcomes: Vec<ClassifyOutcome>,
}

impl ClassifyReport {
    pub fn moved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ClassifyOutcome::Moved { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.total() - self.moved()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyRun {
    /// `unknown/` holds no PDFs
    NoUnfiled,
    /// No category directories besides `unknown/`
    NoCategories,
    Completed(ClassifyReport),
}

/// File every paper in `unknown/` next to its nearest indexed neighbor
///
/// The store is only read. A paper whose text can't be extracted is skipped;
/// encoder or store failures abort the run (files already moved stay moved).
pub fn classify_unfiled(
    layout: &Layout,
    extractor: &dyn TextExtractor,
    embedder: &mut dyn EmbeddingEngine,
    store: &dyn VectorStore,
) -> Result<ClassifyRun> {
    let unfiled = layout.unfiled_papers()?;
    if unfiled.is_empty() {
        return Ok(ClassifyRun::NoUnfiled);
    }

    let categories = layout.categories()?;
    if categories.is_empty() {
        return Ok(ClassifyRun::NoCategories);
    }

    tracing::info!(
        "Classifying {} papers into {} categories",
        unfiled.len(),
        categories.len()
    );

    let mut report = ClassifyReport::default();
    for path in unfiled {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let text = match extractor.extract(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Could not read {}: {:#}", path.display(), e);
                report.outcomes.push(ClassifyOutcome::Skipped {
                    file,
                    reason: SkipReason::Unreadable(format!("{:#}", e)),
                });
                continue;
            }
        };

        let embedding = embedder
            .embed_passage(&text)
            .via(Collaborator::TextEncoder)?;
        let hits = store.query(&embedding, 1).via(Collaborator::VectorStore)?;

        let outcome = match hits.first() {
            None => ClassifyOutcome::Skipped {
                file,
                reason: SkipReason::NoIndexedMatch,
            },
            Some(hit) => match resolve_category(hit, &categories) {
                Some(category) => {
                    move_file(&path, &category.dir.join(&file))?;
                    tracing::debug!(
                        "{} -> {} (nearest: {}, distance {:.4})",
                        file,
                        category.name,
                        hit.filename().unwrap_or(&hit.id),
                        hit.distance
                    );
                    ClassifyOutcome::Moved {
                        file,
                        category: category.name.clone(),
                    }
                }
                None => ClassifyOutcome::Skipped {
                    file,
                    reason: SkipReason::NoMatchingCategory,
                },
            },
        };
        report.outcomes.push(outcome);
    }

    Ok(ClassifyRun::Completed(report))
}

/// Move a file, falling back to copy + remove across filesystems
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_err() {
        std::fs::copy(from, to)
            .with_context(|| format!("Failed to move {} to {}", from.display(), to.display()))?;
        std::fs::remove_file(from)
            .with_context(|| format!("Failed to remove {} after copying", from.display()))?;
    }
    Ok(())
}
