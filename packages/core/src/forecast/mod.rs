//! Traffic Forecasting Pipeline
//!
//! Turns raw per-direction count records into a fixed window, scales it,
//! runs the pre-trained sequence model and labels the result with a
//! congestion category.

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod error;
pub mod lstm;
pub mod model;
pub mod predictor;
pub mod scaler;
pub mod store;
pub mod types;
pub mod window;

#[cfg(test)]
mod tests;

pub use classifier::{classify, Category};
pub use config::PredictorConfig;
pub use error::{ArtifactError, InferenceError, PipelineError, ScalerError, StoreError};
pub use model::{load_model, ForecastModel, PersistenceModel};
pub use predictor::Predictor;
pub use scaler::MinMaxScaler;
pub use store::RecordStore;
pub use types::*;
pub use window::WindowBuilder;
