//! Single source of truth for the agent's filesystem layout.
//!
//! ```text
//! {files_root}/                 # data/files
//! ├── unknown/                  # reserved holding area for unfiled papers
//! └── <category>/*.pdf          # one directory per topic
//! {images_root}/**              # data/images, scanned recursively
//! {index_root}/                 # index
//! ├── paper_db/papers.{db,usearch}
//! └── image_db/images.{db,usearch}
//! ```
//!
//! Nothing is created as a side effect of constructing a [`Layout`];
//! [`Layout::ensure`] is the explicit setup step run once at program entry.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Reserved category for papers that have not been filed yet
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Collection name of the paper store
pub const PAPER_COLLECTION: &str = "papers";

/// Collection name of the image store
pub const IMAGE_COLLECTION: &str = "images";

/// Resolved directory layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub files_root: PathBuf,
    pub images_root: PathBuf,
    pub index_root: PathBuf,
}

impl Layout {
    pub fn new(
        files_root: impl Into<PathBuf>,
        images_root: impl Into<PathBuf>,
        index_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            files_root: files_root.into(),
            images_root: images_root.into(),
            index_root: index_root.into(),
        }
    }

    /// Layout rooted under a single base directory (tests, scratch setups)
    pub fn under(base: &Path) -> Self {
        Self::new(
            base.join("data/files"),
            base.join("data/images"),
            base.join("index"),
        )
    }

    /// Holding area for unfiled papers: `{files_root}/unknown/`
    pub fn unknown_dir(&self) -> PathBuf {
        self.category_dir(UNKNOWN_CATEGORY)
    }

    /// Directory of one category: `{files_root}/{name}/`
    pub fn category_dir(&self, name: &str) -> PathBuf {
        self.files_root.join(name)
    }

    /// Paper vector store: `{index_root}/paper_db/`
    pub fn paper_store_dir(&self) -> PathBuf {
        self.index_root.join("paper_db")
    }

    /// Image vector store: `{index_root}/image_db/`
    pub fn image_store_dir(&self) -> PathBuf {
        self.index_root.join("image_db")
    }

    /// Create the root directories if missing. Safe to call repeatedly.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.files_root, &self.unknown_dir(), &self.images_root] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    /// Category directories under the files root, `unknown` excluded,
    /// sorted by name so resolution order never depends on the platform.
    pub fn categories(&self) -> Result<Vec<Category>> {
        if !self.files_root.exists() {
            return Ok(Vec::new());
        }

        let mut categories = Vec::new();
        let entries = std::fs::read_dir(&self.files_root)
            .with_context(|| format!("Failed to list {}", self.files_root.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name == UNKNOWN_CATEGORY {
                continue;
            }
            categories.push(Category {
                name,
                dir: entry.path(),
            });
        }

        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    /// PDFs waiting in `unknown/` (top level only), sorted by file name
    pub fn unfiled_papers(&self) -> Result<Vec<PathBuf>> {
        let dir = self.unknown_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut papers = Vec::new();
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to list {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && crate::extract::is_supported_document(&path) {
                papers.push(path);
            }
        }

        papers.sort();
        Ok(papers)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new("data/files", "data/images", "index")
    }
}

/// A filing category backed by a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub dir: PathBuf,
}

impl Category {
    /// Does this category directory hold a file with exactly this name?
    pub fn contains(&self, filename: &str) -> bool {
        self.dir.join(filename).is_file()
    }
}
