//! batch_classify command - file everything in unknown/ by nearest neighbor

use anyhow::Result;
use papyrus::classify::{classify_unfiled, ClassifyOutcome, ClassifyRun};
use papyrus::embeddings::create_text_embedder;
use papyrus::extract::PdfExtractor;
use papyrus::Config;

pub fn execute(config: &Config) -> Result<()> {
    let layout = config.layout();
    let mut embedder = create_text_embedder(&config.models)?;
    let store = super::open_paper_store(&layout, embedder.dimension())?;

    match classify_unfiled(&layout, &PdfExtractor, embedder.as_mut(), &store)? {
        ClassifyRun::NoUnfiled => println!("No files in unknown/"),
        ClassifyRun::NoCategories => println!("No existing categories to classify into."),
        ClassifyRun::Completed(report) => {
            println!("Classifying {} papers...", report.total());
            for outcome in &report.outcomes {
                match outcome {
                    ClassifyOutcome::Moved { file, category } => {
                        println!("➡️ {} → {}", file, category);
                    }
                    ClassifyOutcome::Skipped { file, reason } => {
                        println!("⚠️ Skip {}, {}.", file, reason);
                    }
                }
            }
            println!();
            println!(
                "✅ Batch classification completed. {} moved, {} skipped.",
                report.moved(),
                report.skipped()
            );
        }
    }
    Ok(())
}
