//! Configuration for the forecasting pipeline

use serde::{Deserialize, Serialize};

/// Number of time bins fed to the model per forecast.
pub const DEFAULT_WINDOW_SIZE: usize = 6;

/// Raw records fetched per request: one row per direction per bin.
pub const DEFAULT_FETCH_LIMIT: usize = DEFAULT_WINDOW_SIZE * 2;

/// Configuration for the predictor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub window_size: usize,
    pub fetch_limit: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }
}
