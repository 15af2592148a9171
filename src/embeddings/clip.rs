//! CLIP joint image/text encoder on ONNX Runtime (ViT-B/32 layout)
//!
//! Images and text land in the same embedding space, so a text query can be
//! searched against indexed image vectors.
//!
//! Model directory layout (as exported by Xenova/clip-vit-base-patch32):
//! - `vision_model.onnx` - `pixel_values` [1, 3, 224, 224] → `image_embeds`
//! - `text_model.onnx` - `input_ids` (+ `attention_mask`) → `text_embeds`
//! - `tokenizer.json`

use super::similarity::l2_normalize;
use super::ImageEmbeddingEngine;
use anyhow::{anyhow, bail, Context, Result};
use image::imageops::FilterType;
use ndarray::{Array2, Array4};
use ort::{inputs, session::Session, value::Value};
use std::path::Path;
use tokenizers::Tokenizer;

/// Input resolution of the CLIP vision tower
pub const CLIP_IMAGE_SIZE: u32 = 224;

/// CLIP RGB normalization mean
pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP RGB normalization std
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_1];

/// Context length of the CLIP text tower
const CLIP_CONTEXT_LENGTH: usize = 77;

pub struct ClipEmbedder {
    vision: Session,
    text: Session,
    tokenizer: Tokenizer,
    dimension: usize,
    model_name: String,
    text_takes_attention_mask: bool,
}

impl ClipEmbedder {
    /// Load both towers and the tokenizer from a model directory
    pub fn from_dir(model_dir: &Path, dimension: usize) -> Result<Self> {
        let vision_path = model_dir.join("vision_model.onnx");
        let text_path = model_dir.join("text_model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        for path in [&vision_path, &text_path, &tokenizer_path] {
            if !path.exists() {
                bail!(
                    "CLIP model file not found at: {}\n\n\
                    Download the ONNX export into {}:\n  \
                    https://huggingface.co/Xenova/clip-vit-base-patch32/tree/main/onnx\n  \
                    https://huggingface.co/Xenova/clip-vit-base-patch32/resolve/main/tokenizer.json",
                    path.display(),
                    model_dir.display()
                );
            }
        }

        let vision = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&vision_path)
            .context("Failed to load CLIP vision model")?;
        let text = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&text_path)
            .context("Failed to load CLIP text model")?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: CLIP_CONTEXT_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure truncation: {}", e))?;

        let text_takes_attention_mask = text.inputs.iter().any(|i| i.name == "attention_mask");
        let model_name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "clip".to_string());

        tracing::debug!("Loaded CLIP encoder '{}' from {}", model_name, model_dir.display());

        Ok(Self {
            vision,
            text,
            tokenizer,
            dimension,
            model_name,
            text_takes_attention_mask,
        })
    }

    fn check_width(&self, width: usize, tower: &str) -> Result<()> {
        if width != self.dimension {
            bail!(
                "CLIP {} tower produces {}-dimensional embeddings, configured for {}",
                tower,
                width,
                self.dimension
            );
        }
        Ok(())
    }
}

impl ImageEmbeddingEngine for ClipEmbedder {
    fn embed_image(&mut self, path: &Path) -> Result<Vec<f32>> {
        let pixels = preprocess_image(path)?;
        let size = CLIP_IMAGE_SIZE as usize;
        let pixel_values = Array4::from_shape_vec((1, 3, size, size), pixels)
            .context("Failed to create pixel_values array")?;

        let (width, embedding) = {
            let outputs = self
                .vision
                .run(inputs!["pixel_values" => Value::from_array(pixel_values)?])
                .context("CLIP vision inference failed")?;
            let (shape, data) = outputs["image_embeds"]
                .try_extract_tensor::<f32>()
                .context("Failed to extract image_embeds tensor")?;
            let width = shape.as_ref().last().copied().unwrap_or(0) as usize;
            (width, data[..width.min(data.len())].to_vec())
        };

        self.check_width(width, "vision")?;
        Ok(l2_normalize(&embedding))
    }

    fn embed_text(&mut self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&x| x as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| x as i64)
            .collect();
        let seq_len = input_ids.len();

        let input_ids_array = Array2::from_shape_vec((1, seq_len), input_ids)
            .context("Failed to create input_ids array")?;
        let attention_mask_array = Array2::from_shape_vec((1, seq_len), attention_mask)
            .context("Failed to create attention_mask array")?;

        let (width, embedding) = {
            let outputs = if self.text_takes_attention_mask {
                self.text.run(inputs![
                    "input_ids" => Value::from_array(input_ids_array)?,
                    "attention_mask" => Value::from_array(attention_mask_array)?
                ])
            } else {
                self.text
                    .run(inputs!["input_ids" => Value::from_array(input_ids_array)?])
            }
            .context("CLIP text inference failed")?;

            let (shape, data) = outputs["text_embeds"]
                .try_extract_tensor::<f32>()
                .context("Failed to extract text_embeds tensor")?;
            let width = shape.as_ref().last().copied().unwrap_or(0) as usize;
            (width, data[..width.min(data.len())].to_vec())
        };

        self.check_width(width, "text")?;
        Ok(l2_normalize(&embedding))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Decode an image file into a normalized CHW tensor for the vision tower
///
/// 1. Decode (format from the file contents/extension)
/// 2. Resize the short side to 224 and center-crop to 224x224
/// 3. Convert to RGB
/// 4. Normalize each channel: (value/255 - mean) / std
///
/// Returns 3 * 224 * 224 values laid out channel by channel.
pub fn preprocess_image(path: &Path) -> Result<Vec<f32>> {
    let img = image::open(path)
        .with_context(|| format!("Failed to decode image {}", path.display()))?;

    let resized = img.resize_to_fill(CLIP_IMAGE_SIZE, CLIP_IMAGE_SIZE, FilterType::CatmullRom);
    let rgb = resized.to_rgb8();

    let plane = (CLIP_IMAGE_SIZE * CLIP_IMAGE_SIZE) as usize;
    let mut tensor = vec![0.0f32; plane * 3];
    for (i, pixel) in rgb.pixels().enumerate() {
        for channel in 0..3 {
            let value = f32::from(pixel[channel]) / 255.0;
            tensor[channel * plane + i] = (value - CLIP_MEAN[channel]) / CLIP_STD[channel];
        }
    }

    Ok(tensor)
}
