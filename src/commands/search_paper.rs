//! search_paper command - free-text search over indexed papers

use anyhow::Result;
use papyrus::embeddings::create_text_embedder;
use papyrus::query::{search_papers, SearchOptions, SearchOutcome};
use papyrus::Config;

pub fn execute(config: &Config, query: &str) -> Result<()> {
    let layout = config.layout();
    let mut embedder = create_text_embedder(&config.models)?;
    let store = super::open_paper_store(&layout, embedder.dimension())?;

    let options = SearchOptions::from(&config.search);
    match search_papers(query, embedder.as_mut(), &store, &options)? {
        SearchOutcome::EmptyStore => {
            println!("⚠️ Paper database is empty. Please add papers first.");
        }
        SearchOutcome::NoMatches => println!("⚠️ No matching papers found."),
        SearchOutcome::Ranked(list) => super::print_ranked("🔍 Paper Search Results", &list),
    }
    Ok(())
}
