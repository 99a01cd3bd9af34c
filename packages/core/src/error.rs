use std::error::Error;
use std::fmt;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::forecast::{ArtifactError, PipelineError};

/// Unified application error.
///
/// Startup failures (config, database, artifacts) and per-request failures
/// (pipeline, timeout) share one type so handlers can return it directly.
#[derive(Debug)]
pub enum AppError {
    Config(String),
    Database(String),
    Artifact(String),
    Timeout(Duration),
    Pipeline(PipelineError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Pipeline(err) => match err {
                PipelineError::NoData { .. } => StatusCode::NOT_FOUND,
                PipelineError::InsufficientHistory { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                PipelineError::Scaler(_) | PipelineError::Inference(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) | AppError::Artifact(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Pipeline(err) => err.kind(),
            AppError::Timeout(_) => "timeout",
            AppError::Database(_) => "database",
            AppError::Config(_) => "config",
            AppError::Artifact(_) => "artifact",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Config error: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Artifact(msg) => write!(f, "Artifact error: {}", msg),
            AppError::Timeout(after) => {
                write!(f, "Prediction timed out after {}s", after.as_secs_f64())
            }
            AppError::Pipeline(err) => write!(f, "{}", err),
        }
    }
}

impl Error for AppError {}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::Pipeline(err)
    }
}

impl From<ArtifactError> for AppError {
    fn from(err: ArtifactError) -> Self {
        AppError::Artifact(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
