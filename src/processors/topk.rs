//! Top-K ranking over raw category scores.
//!
//! The ranker turns the flat score vector produced by the forward pass into
//! the K best (category, score) pairs, ordered by descending score. Ties are
//! broken by ascending category index, which keeps the output deterministic
//! for repeated runs over the same scores.

use crate::core::errors::{ClassifierError, ClassifierResult};

/// One ranked prediction: a category index paired with its raw score.
///
/// Scores are reported exactly as the model emitted them; no softmax or other
/// normalization is applied.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScenePrediction {
    /// Index into the category label space.
    pub category: usize,
    /// Raw score the model assigned to the category.
    pub score: f32,
}

/// Selects the K highest-scoring categories from a score vector.
#[derive(Debug, Clone, Copy)]
pub struct TopK {
    k: usize,
}

impl TopK {
    /// Creates a ranker that keeps the `k` best categories.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::ConfigError`] if `k` is zero.
    pub fn new(k: usize) -> ClassifierResult<Self> {
        if k == 0 {
            return Err(ClassifierError::config_error(
                "top_k must be greater than 0",
            ));
        }
        Ok(Self { k })
    }

    /// Number of predictions the ranker returns.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Ranks a score vector and returns the K best predictions.
    ///
    /// The result is sorted by descending score; equal scores keep ascending
    /// category order. NaN scores sort after every real score so a partially
    /// corrupt output still ranks deterministically.
    ///
    /// # Arguments
    ///
    /// * `scores` - One score per category, indexed from 0.
    ///
    /// # Returns
    ///
    /// Exactly `k` predictions.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InsufficientOutputSize`] if the vector
    /// holds fewer than `k` scores. Nothing is ranked in that case.
    pub fn rank(&self, scores: &[f32]) -> ClassifierResult<Vec<ScenePrediction>> {
        if scores.len() < self.k {
            return Err(ClassifierError::InsufficientOutputSize {
                required: self.k,
                actual: scores.len(),
            });
        }

        let mut ranked: Vec<ScenePrediction> = scores
            .iter()
            .copied()
            .enumerate()
            .map(|(category, score)| ScenePrediction { category, score })
            .collect();

        // Stable sort, so equal scores keep their ascending category order.
        ranked.sort_by(|a, b| match b.score.partial_cmp(&a.score) {
            Some(ordering) => ordering,
            None => a.score.is_nan().cmp(&b.score.is_nan()),
        });
        ranked.truncate(self.k);
        Ok(ranked)
    }
}
