//! Match evaluation: compare a unit's embeddings against the target vector.

use crate::types::{Embedding, TargetVector};

/// One embedding of a unit that fell within the distance threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatch {
    /// Index of the embedding within the unit's detection sequence.
    pub index: usize,
    pub distance: f32,
    /// `max(0, 1 - distance)`, clamped so distances above 1 never produce a
    /// negative confidence.
    pub confidence: f32,
}

/// Evaluate every embedding of one unit against the target.
///
/// A pair matches iff `distance <= threshold`. Evaluation is exhaustive —
/// multiple embeddings in one unit may each independently match; callers
/// that only want one match per unit (folder mode) take the first result.
pub fn evaluate<'a, I>(embeddings: I, target: &TargetVector, threshold: f32) -> Vec<EmbeddingMatch>
where
    I: IntoIterator<Item = &'a Embedding>,
{
    embeddings
        .into_iter()
        .enumerate()
        .filter_map(|(index, embedding)| {
            let distance = embedding.distance(target.embedding());
            if distance <= threshold {
                Some(EmbeddingMatch {
                    index,
                    distance,
                    confidence: (1.0 - distance).max(0.0),
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: Vec<f32>) -> Embedding {
        Embedding { values, model_version: None }
    }

    fn target(values: Vec<f32>) -> TargetVector {
        TargetVector::new(emb(values), "target.jpg")
    }

    #[test]
    fn test_empty_unit_is_noop() {
        let embeddings: Vec<Embedding> = vec![];
        let matches = evaluate(&embeddings, &target(vec![1.0, 0.0]), 0.6);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_match_at_exact_threshold() {
        // Distance 0.5 with threshold 0.5 is a match (<=, not <).
        let embeddings = [emb(vec![0.5, 0.0])];
        let matches = evaluate(&embeddings, &target(vec![0.0, 0.0]), 0.5);
        assert_eq!(matches.len(), 1);
        assert!((matches[0].distance - 0.5).abs() < 1e-6);
        assert!((matches[0].confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_scenario_distance_point_three() {
        let embeddings = [emb(vec![0.3, 0.0])];
        let matches = evaluate(&embeddings, &target(vec![0.0, 0.0]), 0.45);
        assert_eq!(matches.len(), 1);
        assert!((matches[0].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_no_match_beyond_threshold() {
        let embeddings = [emb(vec![0.5, 0.0])];
        let matches = evaluate(&embeddings, &target(vec![0.0, 0.0]), 0.45);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_exhaustive_multiple_matches_per_unit() {
        let embeddings = [
            emb(vec![0.1, 0.0]),
            emb(vec![0.9, 0.0]), // outside threshold
            emb(vec![0.2, 0.0]),
        ];
        let matches = evaluate(&embeddings, &target(vec![0.0, 0.0]), 0.45);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].index, 0);
        assert_eq!(matches[1].index, 2);
    }

    #[test]
    fn test_confidence_clamped_at_zero() {
        // Distance > 1 with a generous threshold: confidence clamps to 0.
        let embeddings = [emb(vec![1.5, 0.0])];
        let matches = evaluate(&embeddings, &target(vec![0.0, 0.0]), 2.0);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].confidence, 0.0);
    }

    #[test]
    fn test_confidence_always_in_unit_interval() {
        let distances = [0.0f32, 0.3, 0.99, 1.0, 1.7, 2.0];
        for &d in &distances {
            let embeddings = [emb(vec![d, 0.0])];
            let matches = evaluate(&embeddings, &target(vec![0.0, 0.0]), 2.0);
            let c = matches[0].confidence;
            assert!((0.0..=1.0).contains(&c), "distance {d} gave confidence {c}");
        }
    }

    #[test]
    fn test_threshold_monotonicity() {
        // A wider threshold's match set is a superset of a narrower one's.
        let embeddings = [
            emb(vec![0.1, 0.0]),
            emb(vec![0.4, 0.0]),
            emb(vec![0.55, 0.0]),
            emb(vec![1.1, 0.0]),
        ];
        let t = target(vec![0.0, 0.0]);
        let narrow: Vec<usize> =
            evaluate(&embeddings, &t, 0.45).into_iter().map(|m| m.index).collect();
        let wide: Vec<usize> =
            evaluate(&embeddings, &t, 0.6).into_iter().map(|m| m.index).collect();
        for idx in &narrow {
            assert!(wide.contains(idx), "index {idx} lost when widening threshold");
        }
        assert!(wide.len() >= narrow.len());
    }
}
