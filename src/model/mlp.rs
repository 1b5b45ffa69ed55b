//! Feed-forward MLP regressor evaluation.
//!
//! The trained artifacts store per-layer weight matrices and bias vectors.
//! Evaluation is the standard forward pass: ReLU on hidden layers, identity
//! on the output layer, one output unit. No training code lives here.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::model::Regressor;

/// One affine layer as persisted: `weights` is row-major `[outputs][inputs]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpec {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

/// Persisted form of a trained MLP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpSpec {
    pub layers: Vec<LayerSpec>,
}

/// A loaded MLP regressor (frozen after construction).
#[derive(Debug, Clone)]
pub struct MlpRegressor {
    layers: Vec<(DMatrix<f64>, DVector<f64>)>,
    input_width: usize,
}

impl MlpRegressor {
    /// Build from a persisted spec, validating layer chaining.
    pub fn from_spec(spec: &MlpSpec) -> Result<Self, PredictError> {
        if spec.layers.is_empty() {
            return Err(PredictError::Artifact("mlp has no layers".to_string()));
        }

        let mut layers = Vec::with_capacity(spec.layers.len());
        let mut width = None;
        for (i, layer) in spec.layers.iter().enumerate() {
            let outputs = layer.weights.len();
            if outputs == 0 || layer.bias.len() != outputs {
                return Err(PredictError::Artifact(format!(
                    "mlp layer {i}: {} bias terms for {} output rows",
                    layer.bias.len(),
                    outputs
                )));
            }
            let inputs = layer.weights[0].len();
            if inputs == 0 || layer.weights.iter().any(|row| row.len() != inputs) {
                return Err(PredictError::Artifact(format!("mlp layer {i}: ragged weight rows")));
            }
            if i == 0 {
                width = Some(inputs);
            }
            if i > 0 {
                let prev_outputs = spec.layers[i - 1].weights.len();
                if inputs != prev_outputs {
                    return Err(PredictError::Artifact(format!(
                        "mlp layer {i} expects {inputs} inputs but layer {} emits {prev_outputs}",
                        i - 1
                    )));
                }
            }

            let flat: Vec<f64> = layer.weights.iter().flatten().copied().collect();
            layers.push((
                DMatrix::from_row_slice(outputs, inputs, &flat),
                DVector::from_row_slice(&layer.bias),
            ));
        }

        let last_outputs = spec.layers.last().map(|l| l.weights.len()).unwrap_or(0);
        if last_outputs != 1 {
            return Err(PredictError::Artifact(format!(
                "mlp output layer must have 1 unit, has {last_outputs}"
            )));
        }

        Ok(Self {
            layers,
            input_width: width.unwrap_or(0),
        })
    }
}

impl Regressor for MlpRegressor {
    fn predict(&self, input: &[f64]) -> Result<f64, String> {
        if input.len() != self.input_width {
            return Err(format!(
                "input width {} does not match trained width {}",
                input.len(),
                self.input_width
            ));
        }

        let mut h = DVector::from_row_slice(input);
        let last = self.layers.len() - 1;
        for (i, (w, b)) in self.layers.iter().enumerate() {
            h = w * h + b;
            if i < last {
                h.apply(|v| *v = v.max(0.0));
            }
        }

        let out = h[0];
        if !out.is_finite() {
            return Err("non-finite output".to_string());
        }
        Ok(out)
    }

    fn input_width(&self) -> usize {
        self.input_width
    }
}
