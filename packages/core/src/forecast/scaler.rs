//! Feature Scaler
//!
//! Min-max scaling with parameters fitted offline. The arithmetic matches
//! scikit-learn's `MinMaxScaler`, so an exported `data_min_` / `data_max_`
//! pair reproduces the training-time transform exactly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::forecast::{
    artifact::{check_finite, read_json},
    error::{ArtifactError, ScalerError},
    types::{FeatureWindow, ScaledForecast, ScaledWindow, VolumePair, FEATURE_COLUMNS},
};

/// On-disk form of a fitted min-max scaler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Fitted per-column min-max transform. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    scale: Vec<f64>,
    offset: Vec<f64>,
}

impl MinMaxScaler {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact: ScalerArtifact = read_json(path)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ScalerArtifact) -> Result<Self, ArtifactError> {
        let (lo, hi) = artifact.feature_range;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(ArtifactError::invalid(format!(
                "feature_range ({lo}, {hi}) must be finite and increasing"
            )));
        }
        if artifact.data_min.is_empty() || artifact.data_min.len() != artifact.data_max.len() {
            return Err(ArtifactError::invalid(format!(
                "data_min has {} columns but data_max has {}",
                artifact.data_min.len(),
                artifact.data_max.len()
            )));
        }
        check_finite("data_min", &artifact.data_min)?;
        check_finite("data_max", &artifact.data_max)?;

        if let Some(names) = &artifact.feature_names {
            if names.len() != artifact.data_min.len() {
                return Err(ArtifactError::invalid(format!(
                    "{} feature names for {} columns",
                    names.len(),
                    artifact.data_min.len()
                )));
            }
            if names.len() == FEATURE_COLUMNS.len()
                && names.iter().zip(FEATURE_COLUMNS).any(|(a, b)| a != b)
            {
                return Err(ArtifactError::invalid(format!(
                    "scaler was fitted on {names:?}, expected {FEATURE_COLUMNS:?}"
                )));
            }
        }

        let (scale, offset) = artifact
            .data_min
            .iter()
            .zip(&artifact.data_max)
            .map(|(&min, &max)| {
                let range = max - min;
                // Constant columns scale by 1, as scikit-learn does.
                let range = if range == 0.0 { 1.0 } else { range };
                let scale = (hi - lo) / range;
                (scale, lo - min * scale)
            })
            .unzip();

        Ok(Self { scale, offset })
    }

    /// Number of columns the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.scale.len()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ScalerError> {
        rows.iter()
            .map(|row| {
                self.check_columns(row)?;
                Ok(row
                    .iter()
                    .zip(self.scale.iter().zip(&self.offset))
                    .map(|(x, (scale, offset))| x * scale + offset)
                    .collect())
            })
            .collect()
    }

    pub fn inverse_transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ScalerError> {
        rows.iter()
            .map(|row| {
                self.check_columns(row)?;
                Ok(row
                    .iter()
                    .zip(self.scale.iter().zip(&self.offset))
                    .map(|(x, (scale, offset))| (x - offset) / scale)
                    .collect())
            })
            .collect()
    }

    /// Scale a feature window into model space.
    pub fn normalize(&self, window: &FeatureWindow) -> Result<ScaledWindow, ScalerError> {
        let rows: Vec<Vec<f64>> = window.values().into_iter().map(VolumePair::to_row).collect();
        let scaled = self.transform(&rows)?;
        let steps = scaled
            .iter()
            .map(|row| Self::pair(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScaledWindow { steps })
    }

    /// Map a model output back to vehicle counts.
    pub fn denormalize(&self, forecast: &ScaledForecast) -> Result<VolumePair, ScalerError> {
        let restored = self.inverse_transform(&[forecast.0.to_row()])?;
        match restored.first() {
            Some(row) => Self::pair(row),
            None => Err(ScalerError::ColumnMismatch {
                expected: FEATURE_COLUMNS.len(),
                found: 0,
            }),
        }
    }

    fn check_columns(&self, row: &[f64]) -> Result<(), ScalerError> {
        if row.len() == self.n_features() {
            Ok(())
        } else {
            Err(ScalerError::ColumnMismatch {
                expected: self.n_features(),
                found: row.len(),
            })
        }
    }

    fn pair(row: &[f64]) -> Result<VolumePair, ScalerError> {
        VolumePair::from_row(row).ok_or(ScalerError::ColumnMismatch {
            expected: FEATURE_COLUMNS.len(),
            found: row.len(),
        })
    }
}
