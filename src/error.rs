//! Crate-wide error taxonomy.
//!
//! The pipeline distinguishes "bad input" from "system/model fault" so that
//! callers can decide whether retrying helps:
//!
//! - `InvalidBidRecord` / `Artifact` / `Usage` — the request or installation
//!   is wrong; retrying the same input will not help (exit 2)
//! - `FeatureShapeMismatch` — the engineered vector disagrees with the fitted
//!   scaler; a deployment fault, never error-corrected at runtime (exit 3)
//! - `ModelInference` — one of the three regressors failed; tagged with the
//!   target so the caller knows which model to suspect (exit 4)

use thiserror::Error;

use crate::domain::ModelTarget;

#[derive(Debug, Error)]
pub enum PredictError {
    /// A required monetary field is missing or zero where a ratio-based
    /// derivation would divide by it.
    #[error("invalid bid record: {0}")]
    InvalidBidRecord(String),

    /// The engineered feature vector does not match the fitted scaler layout.
    ///
    /// There is no partial-match tolerance: feature-set drift between train
    /// and inference is a hard failure.
    #[error("feature shape mismatch: scaler was fit on {expected} columns, got {got}")]
    FeatureShapeMismatch { expected: usize, got: usize },

    /// One of the three ensemble regressors failed. Partial triples are
    /// never returned.
    #[error("model inference failed for {target}: {detail}")]
    ModelInference { target: ModelTarget, detail: String },

    /// A model/vocabulary/scaler artifact could not be loaded or is invalid.
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Malformed CLI input or record file.
    #[error("{0}")]
    Usage(String),
}

impl PredictError {
    /// Process exit code for the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            PredictError::InvalidBidRecord(_) => 2,
            PredictError::Artifact(_) => 2,
            PredictError::Usage(_) => 2,
            PredictError::FeatureShapeMismatch { .. } => 3,
            PredictError::ModelInference { .. } => 4,
        }
    }
}
