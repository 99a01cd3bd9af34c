//! Error types for forecasting operations

use std::path::PathBuf;

use thiserror::Error;

/// Failures while turning raw records into a feature window
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("no records to aggregate")]
    NoData,

    #[error("need {required} time bins, found {available}")]
    InsufficientHistory { required: usize, available: usize },
}

/// Failures while applying the fitted scaler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScalerError {
    #[error("expected {expected} feature columns, got {found}")]
    ColumnMismatch { expected: usize, found: usize },
}

/// Failures while running the forecast model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("{what}: expected {expected}, got {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("model produced a non-finite output")]
    NonFinite,

    #[error("{message}")]
    Failed { message: String },
}

/// Errors from record store backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("query failed: {message}")]
    Query { message: String },

    #[error("malformed row: {message}")]
    Decode { message: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Query { message: err.to_string() }
    }
}

/// Errors raised while loading model or scaler artifacts at startup
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid artifact: {message}")]
    Invalid { message: String },
}

impl ArtifactError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }
}

/// Every way a single `predict` call can fail.
///
/// The display strings are what API clients see in `{ "error": ... }`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("No traffic data available for location '{location}'")]
    NoData { location: String },

    #[error("Not enough history to forecast: need {required} time bins, found {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Scaler error: {0}")]
    Scaler(#[from] ScalerError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl PipelineError {
    /// Stable label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::NoData { .. } => "no_data",
            PipelineError::InsufficientHistory { .. } => "insufficient_history",
            PipelineError::Scaler(_) => "scaler_error",
            PipelineError::Inference(_) => "inference_error",
            PipelineError::StoreUnavailable(_) => "store_unavailable",
        }
    }

    pub(crate) fn from_window(err: WindowError, location: &str) -> Self {
        match err {
            WindowError::NoData => PipelineError::NoData {
                location: location.to_string(),
            },
            WindowError::InsufficientHistory { required, available } => {
                PipelineError::InsufficientHistory { required, available }
            }
        }
    }
}
