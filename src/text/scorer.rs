//! Frozen-vocabulary TF-IDF text scoring.
//!
//! The scorer holds a vocabulary→index mapping and per-term IDF weights, fit
//! once at training time and never refit here. A token sequence becomes a
//! sparse TF-IDF row (sublinear TF, frozen IDF, L2-normalized), then reduces
//! to one scalar by summing `column_index × weight` over nonzero entries.
//!
//! That reduction weights each term by its position in the vocabulary
//! ordering rather than by importance alone. It is a frozen compatibility
//! contract with the trained regressors: changing it (to a norm, a sum, a
//! max) silently shifts every text score the models were trained against.

use std::collections::HashMap;

use crate::error::PredictError;

/// Relevance scorer over a frozen vocabulary.
#[derive(Debug, Clone)]
pub struct TextScorer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TextScorer {
    /// Build a scorer from a fitted vocabulary and its IDF weights.
    ///
    /// The vocabulary must be a dense index assignment: every index in
    /// `0..idf.len()` taken exactly once.
    pub fn new(vocabulary: HashMap<String, usize>, idf: Vec<f64>) -> Result<Self, PredictError> {
        if vocabulary.len() != idf.len() {
            return Err(PredictError::Artifact(format!(
                "vocabulary has {} terms but {} idf weights",
                vocabulary.len(),
                idf.len()
            )));
        }
        let mut seen = vec![false; idf.len()];
        for (term, &idx) in &vocabulary {
            let slot = seen.get_mut(idx).ok_or_else(|| {
                PredictError::Artifact(format!(
                    "vocabulary index {idx} for term '{term}' out of range"
                ))
            })?;
            if *slot {
                return Err(PredictError::Artifact(format!(
                    "duplicate vocabulary index {idx}"
                )));
            }
            *slot = true;
        }
        Ok(Self { vocabulary, idf })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Score a sequence of content tokens.
    ///
    /// Returns exactly 0.0 for empty input or input with no vocabulary
    /// overlap; out-of-vocabulary terms are ignored, not an error.
    pub fn score(&self, tokens: &[String]) -> f64 {
        // Bag-of-terms counts restricted to the vocabulary (1-gram only).
        let mut counts: HashMap<usize, u64> = HashMap::new();
        for token in tokens {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }
        if counts.is_empty() {
            return 0.0;
        }

        // Sublinear TF × frozen IDF.
        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, count)| (idx, (1.0 + (count as f64).ln()) * self.idf[idx]))
            .collect();

        // L2 normalization, matching the trained row construction.
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return 0.0;
        }
        for (_, w) in &mut entries {
            *w /= norm;
        }

        // Index-weighted reduction (frozen quirk, see module docs).
        entries.iter().map(|&(idx, w)| idx as f64 * w).sum()
    }
}
