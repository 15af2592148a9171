pub mod add_paper;
pub mod batch_classify;
pub mod search_image;
pub mod search_paper;

use anyhow::Result;
use papyrus::error::{Collaborator, CollaboratorResultExt};
use papyrus::paths::{Layout, IMAGE_COLLECTION, PAPER_COLLECTION};
use papyrus::query::RankedList;
use papyrus::storage::Collection;

fn open_paper_store(layout: &Layout, dimension: usize) -> Result<Collection> {
    Collection::open(layout.paper_store_dir(), PAPER_COLLECTION, dimension)
        .via(Collaborator::VectorStore)
}

fn open_image_store(layout: &Layout, dimension: usize) -> Result<Collection> {
    Collection::open(layout.image_store_dir(), IMAGE_COLLECTION, dimension)
        .via(Collaborator::VectorStore)
}

fn print_ranked(title: &str, list: &RankedList) {
    println!("{} (Top-{}):", title, list.len());
    for line in list.lines() {
        println!("{}", line);
    }
}
