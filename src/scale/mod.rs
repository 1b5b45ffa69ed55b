//! Fitted affine standardization.
//!
//! Per-column `(x - mean) / scale` where `mean`/`scale` come from the
//! training set and are persisted as an artifact. The fitted state is the
//! only mutable thing crossing the train/infer boundary besides the models
//! themselves, and it is treated as an immutable snapshot once loaded.
//!
//! Zero-variance columns never divide: their scale is coerced to 1.0, so a
//! constant column standardizes to constant zero.

use serde::{Deserialize, Serialize};

use crate::error::PredictError;

/// Fitted standardization state: per-column means and scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl Scaler {
    /// Fit means and scales on a training matrix (rows = samples).
    ///
    /// Uses the population standard deviation. Zero-variance columns get
    /// scale 1.0.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, PredictError> {
        let Some(first) = rows.first() else {
            return Err(PredictError::Usage(
                "cannot fit a scaler on an empty matrix".to_string(),
            ));
        };
        let width = first.len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(PredictError::Usage(
                "cannot fit a scaler on a ragged matrix".to_string(),
            ));
        }

        let n = rows.len() as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m) * (v - m);
            }
        }
        for s in &mut scales {
            let std = (*s / n).sqrt();
            *s = if std == 0.0 { 1.0 } else { std };
        }

        Ok(Self { means, scales })
    }

    /// Rebuild from persisted parts, validating shape consistency.
    pub fn from_parts(means: Vec<f64>, scales: Vec<f64>) -> Result<Self, PredictError> {
        let scaler = Self { means, scales };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Shape consistency check for deserialized state.
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.means.len() != self.scales.len() {
            return Err(PredictError::Artifact(format!(
                "scaler has {} means but {} scales",
                self.means.len(),
                self.scales.len()
            )));
        }
        if self.scales.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(PredictError::Artifact(
                "scaler contains a non-finite or zero scale".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of columns this scaler was fit on.
    pub fn width(&self) -> usize {
        self.means.len()
    }

    /// Standardize one feature vector.
    ///
    /// A width mismatch is a hard failure: there is no partial-match
    /// tolerance between the engineered layout and the fitted state.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, PredictError> {
        if row.len() != self.width() {
            return Err(PredictError::FeatureShapeMismatch {
                expected: self.width(),
                got: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(&v, (&m, &s))| (v - m) / s)
            .collect())
    }

    /// Standardize a matrix of rows.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, PredictError> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}
