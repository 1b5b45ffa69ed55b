//! Versioned artifact store.
//!
//! Trained state reaches the pipeline as opaque JSON blobs keyed by a
//! version string:
//!
//! - `vocabulary.{version}.json` — term→index mapping + IDF weights
//! - `scaler.{version}.json` — fitted means/scales
//! - `model.{bidder,reference,count}.{version}.json` — MLP layer specs
//! - `config.json` — avg-diff ratio + the version the installation serves
//!
//! Everything is loaded once into an immutable `ModelBundle` at process
//! start; hot-swap means constructing a new bundle, never mutating a loaded
//! one.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::domain::PipelineConfig;
use crate::error::PredictError;
use crate::model::{Ensemble, MlpRegressor, MlpSpec, Regressor};
use crate::scale::Scaler;
use crate::text::TextScorer;

/// Persisted vocabulary artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyFile {
    pub terms: HashMap<String, usize>,
    pub idf: Vec<f64>,
}

/// All frozen state one process serves: scorer, scaler, models, config.
pub struct ModelBundle {
    pub scorer: TextScorer,
    pub scaler: Scaler,
    pub ensemble: Ensemble,
    pub config: PipelineConfig,
}

impl ModelBundle {
    /// Assemble a bundle from already-constructed parts (fixtures, tests,
    /// embedded artifacts). Validates that the models accept what the scaler
    /// emits.
    pub fn from_parts(
        scorer: TextScorer,
        scaler: Scaler,
        ensemble: Ensemble,
        config: PipelineConfig,
    ) -> Result<Self, PredictError> {
        scaler.validate()?;
        Ok(Self {
            scorer,
            scaler,
            ensemble,
            config,
        })
    }
}

/// Filesystem-backed store of versioned artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load `config.json`.
    pub fn load_config(&self) -> Result<PipelineConfig, PredictError> {
        self.read_json("config.json")
    }

    /// Load just the text scorer for a version (the `score` front-end does
    /// not need the regressors).
    pub fn load_scorer(&self, version: &str) -> Result<TextScorer, PredictError> {
        let vocabulary: VocabularyFile = self.read_json(&format!("vocabulary.{version}.json"))?;
        debug!(terms = vocabulary.terms.len(), "vocabulary loaded");
        TextScorer::new(vocabulary.terms, vocabulary.idf)
    }

    /// Load the full frozen bundle for a version.
    pub fn load_bundle(&self, version: &str) -> Result<ModelBundle, PredictError> {
        let config = self.load_config()?;

        let scorer = self.load_scorer(version)?;

        let scaler: Scaler = self.read_json(&format!("scaler.{version}.json"))?;
        scaler.validate()?;
        debug!(width = scaler.width(), "scaler loaded");

        let load_model = |name: &str| -> Result<MlpRegressor, PredictError> {
            let spec: MlpSpec = self.read_json(&format!("model.{name}.{version}.json"))?;
            MlpRegressor::from_spec(&spec)
        };
        let bidder = load_model("bidder")?;
        let reference = load_model("reference")?;
        let count = load_model("count")?;

        for (name, model) in [("bidder", &bidder), ("reference", &reference), ("count", &count)] {
            if model.input_width() != scaler.width() {
                return Err(PredictError::Artifact(format!(
                    "{name} model expects {} inputs but scaler emits {}",
                    model.input_width(),
                    scaler.width()
                )));
            }
        }

        info!(
            version,
            vocabulary = scorer.vocabulary_size(),
            features = scaler.width(),
            "artifact bundle loaded"
        );

        ModelBundle::from_parts(
            scorer,
            scaler,
            Ensemble::new(Box::new(bidder), Box::new(reference), Box::new(count)),
            config,
        )
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T, PredictError> {
        let path = self.dir.join(name);
        let file = File::open(&path).map_err(|e| {
            PredictError::Artifact(format!("failed to open '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(file).map_err(|e| {
            PredictError::Artifact(format!("invalid artifact '{}': {e}", path.display()))
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
