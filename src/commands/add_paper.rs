//! add_paper command - index a PDF and file it under its topics

use anyhow::Result;
use papyrus::embeddings::create_text_embedder;
use papyrus::extract::PdfExtractor;
use papyrus::ingest::{ingest_paper, parse_topics, validate_paper};
use papyrus::Config;
use std::path::Path;

pub fn execute(config: &Config, paper_path: &Path, topics: &str) -> Result<()> {
    let topics = parse_topics(topics)?;
    validate_paper(paper_path)?;

    let layout = config.layout();
    let mut embedder = create_text_embedder(&config.models)?;
    let mut store = super::open_paper_store(&layout, embedder.dimension())?;

    let added = ingest_paper(
        paper_path,
        &topics,
        &PdfExtractor,
        embedder.as_mut(),
        &mut store,
        &layout,
        config.search.excerpt_chars,
    )?;

    println!(
        "✅ Paper added: {} → [{}]",
        added.filename,
        added.topics.join(", ")
    );
    Ok(())
}
