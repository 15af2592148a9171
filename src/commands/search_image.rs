//! search_image command - text-to-image search, building the index on first use

use anyhow::Result;
use papyrus::embeddings::create_image_embedder;
use papyrus::extract::list_images;
use papyrus::ingest::{ensure_image_index_from, ImageIndexStatus};
use papyrus::query::{search_images, SearchOptions, SearchOutcome};
use papyrus::Config;

pub fn execute(config: &Config, query: &str) -> Result<()> {
    let layout = config.layout();

    let images = list_images(&layout.images_root);
    if images.is_empty() {
        println!("⚠️ No images found in {}", layout.images_root.display());
        return Ok(());
    }

    let mut embedder = create_image_embedder(&config.models)?;
    let mut store = super::open_image_store(&layout, embedder.dimension())?;

    match ensure_image_index_from(images, embedder.as_mut(), &mut store)? {
        ImageIndexStatus::AlreadyIndexed { count } => {
            tracing::debug!("Image collection already holds {} images", count);
        }
        ImageIndexStatus::Built { indexed, skipped } => {
            println!("📦 Built image vector database ({} images)", indexed);
            for path in &skipped {
                println!("⚠️ Skipped unreadable image {}", path.display());
            }
        }
    }

    let options = SearchOptions::from(&config.search);
    match search_images(query, embedder.as_mut(), &store, &options)? {
        SearchOutcome::EmptyStore | SearchOutcome::NoMatches => {
            println!("⚠️ No matching images found.");
        }
        SearchOutcome::Ranked(list) => super::print_ranked("🖼️ Image Search Results", &list),
    }
    Ok(())
}
