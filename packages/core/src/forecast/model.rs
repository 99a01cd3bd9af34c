//! Forecast Model interface
//!
//! Abstraction over the pre-trained sequence model so the predictor does
//! not depend on a particular network implementation.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::forecast::{
    artifact::read_json,
    error::{ArtifactError, InferenceError},
    lstm::{LstmArtifact, LstmModel},
    types::{ScaledForecast, ScaledWindow},
};

/// A single-step forecaster over normalized feature windows.
///
/// Implementations hold fixed weights and must be deterministic.
pub trait ForecastModel: Send + Sync {
    /// Number of time steps the model consumes per forecast.
    fn window_len(&self) -> usize;

    /// Run one forward pass over exactly `window_len()` steps.
    fn infer(&self, window: &ScaledWindow) -> Result<ScaledForecast, InferenceError>;

    /// Short identifier for logging.
    fn model_name(&self) -> &str;
}

/// On-disk model artifact, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Lstm(LstmArtifact),
    Persistence { window: usize },
}

/// Load a model artifact and validate its shapes.
pub fn load_model(path: &Path) -> Result<Arc<dyn ForecastModel>, ArtifactError> {
    let artifact: ModelArtifact = read_json(path)?;
    build_model(artifact)
}

pub fn build_model(artifact: ModelArtifact) -> Result<Arc<dyn ForecastModel>, ArtifactError> {
    match artifact {
        ModelArtifact::Lstm(lstm) => Ok(Arc::new(LstmModel::from_artifact(lstm)?)),
        ModelArtifact::Persistence { window } => {
            if window == 0 {
                return Err(ArtifactError::invalid("persistence window must be positive"));
            }
            Ok(Arc::new(PersistenceModel::new(window)))
        }
    }
}

pub(crate) fn check_window(window: &ScaledWindow, expected: usize) -> Result<(), InferenceError> {
    if window.steps.len() == expected {
        Ok(())
    } else {
        Err(InferenceError::ShapeMismatch {
            what: "window length",
            expected,
            found: window.steps.len(),
        })
    }
}

/// Naive baseline: the next step equals the last observed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceModel {
    window: usize,
}

impl PersistenceModel {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl ForecastModel for PersistenceModel {
    fn window_len(&self) -> usize {
        self.window
    }

    fn infer(&self, window: &ScaledWindow) -> Result<ScaledForecast, InferenceError> {
        check_window(window, self.window)?;
        let last = window.steps.last().copied().ok_or(InferenceError::ShapeMismatch {
            what: "window length",
            expected: self.window,
            found: 0,
        })?;
        if !last.is_finite() {
            return Err(InferenceError::NonFinite);
        }
        Ok(ScaledForecast(last))
    }

    fn model_name(&self) -> &str {
        "persistence"
    }
}
