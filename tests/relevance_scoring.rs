//! Relevance scoring properties (no models or stores required)

use approx::assert_relative_eq;
use papyrus::scoring::{distance_to_similarity, relevance_percentages, DEFAULT_TEMPERATURE};
use papyrus::AgentError;

#[test]
fn test_distance_to_similarity_cosine() {
    // Identical vectors (cosine distance = 0)
    assert_relative_eq!(distance_to_similarity(0.0), 1.0);
    // Orthogonal vectors (cosine distance = 1)
    assert_relative_eq!(distance_to_similarity(1.0), 0.0);
    // Opposite vectors (cosine distance = 2)
    assert_relative_eq!(distance_to_similarity(2.0), -1.0);

    assert!(distance_to_similarity(0.0) > distance_to_similarity(0.5));
    assert!(distance_to_similarity(0.5) > distance_to_similarity(1.0));
}

#[test]
fn test_percentages_sum_to_hundred() {
    for distances in [
        vec![0.1],
        vec![0.0, 0.2],
        vec![0.05, 0.3, 0.31, 0.9, 1.7],
        vec![1.9, 1.95, 2.0],
    ] {
        for temperature in [0.05, DEFAULT_TEMPERATURE, 1.0, 10.0] {
            let scores = relevance_percentages(&distances, temperature).unwrap();
            assert_eq!(scores.len(), distances.len());
            assert_relative_eq!(scores.iter().sum::<f64>(), 100.0, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_increasing_distance_means_decreasing_relevance() {
    let scores = relevance_percentages(&[0.1, 0.2, 0.35, 0.6, 1.2], DEFAULT_TEMPERATURE).unwrap();
    for pair in scores.windows(2) {
        assert!(pair[0] > pair[1], "{:?} should strictly decrease", scores);
    }
}

#[test]
fn test_equal_distances_share_equally() {
    let scores = relevance_percentages(&[0.4, 0.4, 0.4], DEFAULT_TEMPERATURE).unwrap();
    for score in scores {
        assert_relative_eq!(score, 100.0 / 3.0, epsilon = 1e-9);
    }
}

#[test]
fn test_spread_out_candidates_stay_positive() {
    let scores = relevance_percentages(&[0.0, 0.4, 1.5], 0.5).unwrap();
    assert!(scores[0] > scores[1]);
    assert!(scores[1] > scores[2]);
    assert!(scores.iter().all(|s| *s > 0.0));
}

#[test]
fn test_lower_temperature_sharpens() {
    let sharp = relevance_percentages(&[0.1, 0.5], 0.1).unwrap();
    let soft = relevance_percentages(&[0.1, 0.5], 2.0).unwrap();
    assert!(sharp[0] > soft[0]);
}

#[test]
fn test_large_batches_do_not_overflow() {
    let distances: Vec<f32> = (0..1000).map(|i| i as f32 * 0.002).collect();
    let scores = relevance_percentages(&distances, 1e-4).unwrap();
    assert!(scores.iter().all(|s| s.is_finite()));
    assert_relative_eq!(scores.iter().sum::<f64>(), 100.0, epsilon = 1e-6);
}

#[test]
fn test_empty_input_is_an_error() {
    let err = relevance_percentages(&[], DEFAULT_TEMPERATURE).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AgentError>(),
        Some(AgentError::EmptyDistances)
    ));
}
