//! Papyrus - a local research-paper and image librarian
//!
//! Papers (PDF) and images are embedded into two separate vector collections.
//! Free-text queries return the nearest records with a relevance percentage,
//! and unfiled papers can be sorted into existing topic directories by their
//! nearest indexed neighbor.

pub mod classify;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod paths;
pub mod query;
pub mod scoring;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use error::{AgentError, Collaborator};
pub use paths::Layout;
