//! Emotion vector construction for the emotional engine variant.
//!
//! The engine takes a fixed 8-dimension weighting. The public API exposes
//! five named categories; the remaining slots are reserved by the model and
//! stay zero.

use std::collections::HashMap;

/// Dimension of the vector the engine expects.
pub const EMOTION_DIM: usize = 8;

/// Named categories, in engine slot order.
pub const EMOTION_NAMES: [&str; 5] = ["neutral", "happy", "sad", "angry", "surprise"];

/// Build a normalized emotion vector from named weights.
///
/// Missing names default to zero. The result always sums to 1: if every
/// weight is zero (or none are given) the vector is all-neutral.
pub fn build_emotion_vector(weights: &HashMap<String, f32>) -> [f32; EMOTION_DIM] {
    let mut vector = [0.0f32; EMOTION_DIM];
    for (slot, name) in EMOTION_NAMES.iter().enumerate() {
        vector[slot] = weights.get(*name).copied().unwrap_or(0.0).max(0.0);
    }

    let total: f32 = vector.iter().sum();
    if total > 0.0 {
        for value in vector.iter_mut() {
            *value /= total;
        }
    } else {
        vector[0] = 1.0; // neutral
    }

    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_weights_default_to_neutral() {
        let vector = build_emotion_vector(&HashMap::new());
        assert_eq!(vector[0], 1.0);
        assert!(vector[1..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_all_zero_weights_default_to_neutral() {
        let weights = HashMap::from([("happy".to_string(), 0.0), ("sad".to_string(), 0.0)]);
        let vector = build_emotion_vector(&weights);
        assert_eq!(vector[0], 1.0);
        assert!(vector[1..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_vector_sums_to_one() {
        let weights = HashMap::from([
            ("happy".to_string(), 0.8),
            ("sad".to_string(), 0.4),
            ("angry".to_string(), 0.8),
        ]);
        let vector = build_emotion_vector(&weights);
        let total: f32 = vector.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!((vector[1] - 0.4).abs() < 1e-6);
        assert!((vector[2] - 0.2).abs() < 1e-6);
        assert!((vector[3] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_names_ignored() {
        let weights = HashMap::from([
            ("happy".to_string(), 1.0),
            ("bored".to_string(), 5.0),
        ]);
        let vector = build_emotion_vector(&weights);
        assert_eq!(vector[1], 1.0);
        let total: f32 = vector.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_weights_clamped() {
        let weights = HashMap::from([
            ("happy".to_string(), -1.0),
            ("sad".to_string(), 1.0),
        ]);
        let vector = build_emotion_vector(&weights);
        assert_eq!(vector[2], 1.0);
        assert_eq!(vector[1], 0.0);
    }
}
