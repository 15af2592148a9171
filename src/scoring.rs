//! Relevance scoring - turn store distances into percentages
//!
//! A result list is scored as a probability distribution over the returned
//! candidates, not as an absolute confidence:
//!
//! ```text
//! distance d_i  →  similarity s_i = 1 - d_i
//!               →  w_i = exp((s_i - max(s)) / T)
//!               →  percent_i = w_i / Σw · 100
//! ```
//!
//! Lower temperature `T` concentrates the mass on the closest match, higher
//! temperature flattens it towards uniform.

use crate::error::AgentError;
use anyhow::Result;

/// Temperature used by both search paths unless configured otherwise
pub const DEFAULT_TEMPERATURE: f64 = 0.5;

/// Smallest temperature the scorer will divide by
pub const MIN_TEMPERATURE: f64 = 1e-6;

/// Convert cosine distance to similarity
///
/// Cosine distance lives in [0, 2], so similarity lives in [-1, 1]:
/// - distance 0 → similarity 1.0 (identical direction)
/// - distance 1 → similarity 0.0 (orthogonal)
/// - distance 2 → similarity -1.0 (opposite)
///
/// Negative similarity is kept as-is; it only lowers the candidate's weight.
pub fn distance_to_similarity(distance: f32) -> f64 {
    1.0 - f64::from(distance)
}

/// Score a ranked result list as relevance percentages
///
/// Output order matches input order and the values sum to 100. Fails on an
/// empty list (callers report "no matches" before scoring) and on non-finite
/// distances. Temperatures that are not strictly positive and finite, or are
/// below [`MIN_TEMPERATURE`], are clamped to [`MIN_TEMPERATURE`].
///
/// # Example
/// ```
/// use papyrus::scoring::relevance_percentages;
///
/// let pct = relevance_percentages(&[0.1, 0.3, 0.9], 0.5)?;
/// assert!(pct[0] > pct[1] && pct[1] > pct[2]);
/// assert!((pct.iter().sum::<f64>() - 100.0).abs() < 1e-6);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn relevance_percentages(distances: &[f32], temperature: f64) -> Result<Vec<f64>> {
    if distances.is_empty() {
        return Err(AgentError::EmptyDistances.into());
    }
    if let Some(index) = distances.iter().position(|d| !d.is_finite()) {
        return Err(AgentError::InvalidDistance { index }.into());
    }

    let temperature = effective_temperature(temperature);
    let similarities: Vec<f64> = distances.iter().copied().map(distance_to_similarity).collect();

    // Shift by the max so the largest exponent is exp(0) = 1
    let max_similarity = similarities
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let weights: Vec<f64> = similarities
        .iter()
        .map(|s| ((s - max_similarity) / temperature).exp())
        .collect();
    let total: f64 = weights.iter().sum();

    Ok(weights.iter().map(|w| w / total * 100.0).collect())
}

fn effective_temperature(temperature: f64) -> f64 {
    if temperature.is_finite() && temperature > MIN_TEMPERATURE {
        temperature
    } else {
        MIN_TEMPERATURE
    }
}
