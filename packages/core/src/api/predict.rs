//! Forecast endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::forecast::Forecast;
use super::ApiState;

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub location: Option<String>,
}

/// `GET /predict?location=<name>`
///
/// Runs the pipeline once under the configured timeout. Failures become
/// `{ "error": ... }` bodies via [`AppError`].
pub async fn predict(
    State(state): State<ApiState>,
    Query(params): Query<PredictQuery>,
) -> Result<Json<Forecast>, AppError> {
    let location = params
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| state.default_location.clone());

    let timer = state.metrics.prediction_duration.start_timer();
    let outcome = tokio::time::timeout(state.predict_timeout, state.predictor.predict(&location)).await;
    timer.observe_duration();

    let result = match outcome {
        Ok(Ok(forecast)) => Ok(forecast),
        Ok(Err(err)) => Err(AppError::from(err)),
        Err(_) => Err(AppError::Timeout(state.predict_timeout)),
    };

    match result {
        Ok(forecast) => {
            state.metrics.predictions_total.inc();
            Ok(Json(forecast))
        }
        Err(err) => {
            tracing::warn!(location = %location, kind = err.kind(), "Prediction failed: {}", err);
            state
                .metrics
                .prediction_errors_total
                .with_label_values(&[err.kind()])
                .inc();
            Err(err)
        }
    }
}
