//! Agent configuration (papyrus.toml)
//!
//! Every key is optional; a missing file means all defaults.
//!
//! ```toml
//! [paths]
//! files_root = "data/files"
//! images_root = "data/images"
//! index_root = "index"
//!
//! [search]
//! top_k = 3
//! temperature = 0.5
//! excerpt_chars = 2000
//!
//! [models]
//! text_model_dir = "models/all-minilm-l6-v2"
//! text_dimension = 384
//! clip_model_dir = "models/clip-vit-base-patch32"
//! clip_dimension = 512
//! ```

use crate::error::AgentError;
use crate::paths::Layout;
use crate::scoring::DEFAULT_TEMPERATURE;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "papyrus.toml";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub search: SearchConfig,
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub files_root: PathBuf,
    pub images_root: PathBuf,
    pub index_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let layout = Layout::default();
        Self {
            files_root: layout.files_root,
            images_root: layout.images_root,
            index_root: layout.index_root,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Results shown per search
    pub top_k: usize,
    /// Softmax temperature for relevance percentages
    pub temperature: f64,
    /// Characters of extracted text kept with each paper record
    pub excerpt_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            temperature: DEFAULT_TEMPERATURE,
            excerpt_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelsConfig {
    /// Sentence encoder directory: model.onnx (or model_quantized.onnx) + tokenizer.json
    pub text_model_dir: PathBuf,
    pub text_dimension: usize,
    /// CLIP directory: vision_model.onnx + text_model.onnx + tokenizer.json
    pub clip_model_dir: PathBuf,
    pub clip_dimension: usize,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            text_model_dir: PathBuf::from("models/all-minilm-l6-v2"),
            text_dimension: 384,
            clip_model_dir: PathBuf::from("models/clip-vit-base-patch32"),
            clip_dimension: 512,
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults if it doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.top_k == 0 {
            return Err(AgentError::InvalidConfig("search.top_k must be at least 1".into()).into());
        }
        if !self.search.temperature.is_finite() || self.search.temperature <= 0.0 {
            return Err(AgentError::InvalidConfig(format!(
                "search.temperature must be a positive number, got {}",
                self.search.temperature
            ))
            .into());
        }
        if self.models.text_dimension == 0 || self.models.clip_dimension == 0 {
            return Err(
                AgentError::InvalidConfig("model dimensions must be non-zero".into()).into(),
            );
        }
        Ok(())
    }

    pub fn layout(&self) -> Layout {
        Layout::new(
            &self.paths.files_root,
            &self.paths.images_root,
            &self.paths.index_root,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let temp = TempDir::new()?;
        let config = Config::load(&temp.path().join("papyrus.toml"))?;
        assert_eq!(config, Config::default());
        assert_eq!(config.search.top_k, 3);
        assert_eq!(config.search.excerpt_chars, 2000);
        assert_eq!(config.layout(), Layout::default());
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() -> Result<()> {
        let config = Config::parse(
            r#"
[search]
temperature = 0.25

[paths]
files_root = "library"
"#,
        )?;
        assert_eq!(config.search.temperature, 0.25);
        assert_eq!(config.search.top_k, 3);
        assert_eq!(config.paths.files_root, PathBuf::from("library"));
        assert_eq!(config.paths.images_root, PathBuf::from("data/images"));
        assert_eq!(config.models.text_dimension, 384);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_values() {
        for content in [
            "[search]\ntop_k = 0",
            "[search]\ntemperature = 0.0",
            "[search]\ntemperature = -1.0",
            "[models]\nclip_dimension = 0",
        ] {
            let err = Config::parse(content).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<AgentError>(),
                    Some(AgentError::InvalidConfig(_))
                ),
                "expected InvalidConfig for {content:?}, got {err:#}"
            );
        }
    }

    #[test]
    fn test_malformed_toml_fails() {
        assert!(Config::parse("[search\ntop_k = 3").is_err());
    }
}
