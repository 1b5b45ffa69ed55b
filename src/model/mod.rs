//! Regressor evaluation and the three-target ensemble.
//!
//! The pipeline consumes trained regressors as opaque `vector -> scalar`
//! functions; training happens elsewhere. The shipped evaluation is a
//! feed-forward MLP (`mlp`).

pub mod mlp;

pub use mlp::*;

use crate::domain::{ModelTarget, PredictionTriple};
use crate::error::PredictError;

/// A trained regressor consumed as an opaque function.
///
/// Implementations hold only frozen state and must be safely shareable
/// across concurrent requests. The `Err` detail is tagged with the failing
/// target by the ensemble.
pub trait Regressor: Send + Sync {
    /// Predict one scalar from a scaled feature vector.
    fn predict(&self, input: &[f64]) -> Result<f64, String>;

    /// Input width the regressor was trained on.
    fn input_width(&self) -> usize;
}

/// The three independently trained regressors, invoked with the identical
/// scaled vector. No shared state between them; invocation order is
/// irrelevant.
pub struct Ensemble {
    bidder: Box<dyn Regressor>,
    reference: Box<dyn Regressor>,
    count: Box<dyn Regressor>,
}

impl Ensemble {
    pub fn new(
        bidder: Box<dyn Regressor>,
        reference: Box<dyn Regressor>,
        count: Box<dyn Regressor>,
    ) -> Self {
        Self {
            bidder,
            reference,
            count,
        }
    }

    /// Predict the full triple; a failing regressor aborts the whole call
    /// (no partial triples).
    pub fn predict(&self, input: &[f64]) -> Result<PredictionTriple, PredictError> {
        let run = |model: &dyn Regressor, target: ModelTarget| -> Result<f64, PredictError> {
            model
                .predict(input)
                .map_err(|detail| PredictError::ModelInference { target, detail })
        };

        Ok(PredictionTriple {
            bidder_rate: run(self.bidder.as_ref(), ModelTarget::BidderRate)?,
            reference_rate: run(self.reference.as_ref(), ModelTarget::ReferenceRate)?,
            bidder_count: run(self.count.as_ref(), ModelTarget::BidderCount)?,
        })
    }
}

impl std::fmt::Debug for Ensemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ensemble")
            .field("input_width", &self.bidder.input_width())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);
    impl Regressor for Fixed {
        fn predict(&self, _: &[f64]) -> Result<f64, String> {
            Ok(self.0)
        }
        fn input_width(&self) -> usize {
            3
        }
    }

    struct Failing;
    impl Regressor for Failing {
        fn predict(&self, _: &[f64]) -> Result<f64, String> {
            Err("numerical blow-up".to_string())
        }
        fn input_width(&self) -> usize {
            3
        }
    }

    #[test]
    fn ensemble_returns_atomic_triple() {
        let e = Ensemble::new(Box::new(Fixed(0.85)), Box::new(Fixed(0.87)), Box::new(Fixed(5.2)));
        let triple = e.predict(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(triple.bidder_rate, 0.85);
        assert_eq!(triple.reference_rate, 0.87);
        assert_eq!(triple.bidder_count, 5.2);
    }

    #[test]
    fn failing_regressor_is_tagged_with_its_target() {
        let e = Ensemble::new(Box::new(Fixed(0.85)), Box::new(Failing), Box::new(Fixed(5.2)));
        let err = e.predict(&[0.0, 0.0, 0.0]).unwrap_err();
        match err {
            PredictError::ModelInference { target, .. } => {
                assert_eq!(target, ModelTarget::ReferenceRate);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.exit_code(), 4);
    }
}
