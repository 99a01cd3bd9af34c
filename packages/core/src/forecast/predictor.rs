//! Predictor - orchestrates one forecast request end to end

use std::sync::Arc;

use crate::forecast::{
    classifier::classify,
    config::PredictorConfig,
    error::{ArtifactError, PipelineError},
    model::ForecastModel,
    scaler::MinMaxScaler,
    store::RecordStore,
    types::{DirectionForecast, Forecast},
    window::WindowBuilder,
};

/// Runs fetch, window, normalize, infer, denormalize and classify in order.
///
/// The model and scaler are injected at construction and shared read-only
/// across concurrent requests.
pub struct Predictor {
    store: Arc<dyn RecordStore + Send + Sync>,
    scaler: Arc<MinMaxScaler>,
    model: Arc<dyn ForecastModel>,
    window: WindowBuilder,
    config: PredictorConfig,
}

impl Predictor {
    pub fn new(
        store: Arc<dyn RecordStore + Send + Sync>,
        scaler: Arc<MinMaxScaler>,
        model: Arc<dyn ForecastModel>,
        config: PredictorConfig,
    ) -> Result<Self, ArtifactError> {
        if model.window_len() != config.window_size {
            return Err(ArtifactError::invalid(format!(
                "model consumes {} steps but the pipeline window is {}",
                model.window_len(),
                config.window_size
            )));
        }
        if config.fetch_limit < config.window_size {
            return Err(ArtifactError::invalid(format!(
                "fetch limit {} cannot fill a window of {}",
                config.fetch_limit, config.window_size
            )));
        }

        Ok(Self {
            store,
            scaler,
            model,
            window: WindowBuilder::new(config.window_size),
            config,
        })
    }

    /// Forecast the next time bin for `location`.
    pub async fn predict(&self, location: &str) -> Result<Forecast, PipelineError> {
        let records = self
            .store
            .fetch_recent(location, self.config.fetch_limit)
            .await?;
        tracing::debug!(
            location,
            store = self.store.store_name(),
            records = records.len(),
            "Fetched raw records"
        );

        let window = self
            .window
            .build(&records)
            .map_err(|err| PipelineError::from_window(err, location))?;
        tracing::debug!(location, window = ?window.values(), "Feature window");

        let scaled = self.scaler.normalize(&window)?;
        tracing::debug!(location, scaled = ?scaled.steps, "Scaled window");

        let output = self.model.infer(&scaled)?;
        tracing::debug!(location, model = self.model.model_name(), output = ?output.0, "Scaled forecast");

        let volumes = self.scaler.denormalize(&output)?;

        let forecast = Forecast {
            location: location.to_string(),
            volume_in: direction_forecast(volumes.volume_in),
            volume_out: direction_forecast(volumes.volume_out),
        };
        tracing::info!(
            location,
            volume_in = forecast.volume_in.value,
            volume_out = forecast.volume_out.value,
            "Forecast ready"
        );
        Ok(forecast)
    }
}

/// Round to two decimals and label the reported value.
fn direction_forecast(raw: f64) -> DirectionForecast {
    let value = (raw * 100.0).round() / 100.0;
    DirectionForecast {
        value,
        category: classify(value),
    }
}
