//! Embeddings module - Generate semantic embeddings for text and images
//!
//! Two encoder families, never mixed in one collection:
//! - [`EmbeddingEngine`]: sentence encoder for paper text (ONNX, all-MiniLM layout)
//! - [`ImageEmbeddingEngine`]: CLIP-style joint encoder, images and text in one space

mod clip;
mod onnx;
mod similarity;

pub use clip::{preprocess_image, ClipEmbedder, CLIP_IMAGE_SIZE, CLIP_MEAN, CLIP_STD};
pub use onnx::OnnxEmbedder;
pub use similarity::{cosine_similarity, l2_normalize};

use crate::config::ModelsConfig;
use crate::error::{AgentError, Collaborator};
use anyhow::Result;
use std::path::Path;

/// Trait for text embedding engines
pub trait EmbeddingEngine: Send {
    /// Generate embedding for a single text
    fn embed(&mut self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding for a search query
    ///
    /// For symmetric models (e.g., all-MiniLM), this is identical to embed().
    fn embed_query(&mut self, text: &str) -> Result<Vec<f32>> {
        self.embed(text)
    }

    /// Generate embedding for an indexed document
    fn embed_passage(&mut self, text: &str) -> Result<Vec<f32>> {
        self.embed(text)
    }

    /// Generate embeddings for multiple texts (batch processing)
    fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get embedding dimension (e.g., 384 for all-MiniLM-L6-v2)
    fn dimension(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Trait for joint image/text embedding engines
pub trait ImageEmbeddingEngine: Send {
    /// Embed an image file
    fn embed_image(&mut self, path: &Path) -> Result<Vec<f32>>;

    /// Embed text into the same space as images
    fn embed_text(&mut self, text: &str) -> Result<Vec<f32>>;

    /// Get embedding dimension (e.g., 512 for CLIP ViT-B/32)
    fn dimension(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Create the paper text encoder from configuration
pub fn create_text_embedder(models: &ModelsConfig) -> Result<Box<dyn EmbeddingEngine>> {
    let embedder = OnnxEmbedder::from_dir(&models.text_model_dir, models.text_dimension)
        .map_err(|e| AgentError::collaborator(Collaborator::TextEncoder, e))?;
    Ok(Box::new(embedder))
}

/// Create the CLIP image/text encoder from configuration
pub fn create_image_embedder(models: &ModelsConfig) -> Result<Box<dyn ImageEmbeddingEngine>> {
    let embedder = ClipEmbedder::from_dir(&models.clip_model_dir, models.clip_dimension)
        .map_err(|e| AgentError::collaborator(Collaborator::ImageEncoder, e))?;
    Ok(Box::new(embedder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct CountingEmbedder {
        calls: usize,
    }

    impl EmbeddingEngine for CountingEmbedder {
        fn embed(&mut self, text: &str) -> Result<Vec<f32>> {
            self.calls += 1;
            Ok(vec![text.len() as f32])
        }

        fn dimension(&self) -> usize {
            1
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    #[test]
    fn test_default_batch_embeds_each_text_in_order() -> Result<()> {
        let mut embedder = CountingEmbedder { calls: 0 };
        let texts = vec!["a".to_string(), "abc".to_string()];
        let embeddings = embedder.embed_batch(&texts)?;
        assert_eq!(embeddings, vec![vec![1.0], vec![3.0]]);
        assert_eq!(embedder.calls, 2);
        assert_eq!(embedder.embed_query("ab")?, embedder.embed_passage("ab")?);
        Ok(())
    }

    #[test]
    fn test_factories_report_unavailable_encoders() {
        let models = ModelsConfig {
            text_model_dir: PathBuf::from("/nonexistent/text"),
            clip_model_dir: PathBuf::from("/nonexistent/clip"),
            ..ModelsConfig::default()
        };

        let err = create_text_embedder(&models).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::CollaboratorUnavailable {
                collaborator: Collaborator::TextEncoder,
                ..
            })
        ));

        let err = create_image_embedder(&models).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::CollaboratorUnavailable {
                collaborator: Collaborator::ImageEncoder,
                ..
            })
        ));
    }
}
