//! Core data types for the forecasting pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::forecast::classifier::Category;

/// Feature column order the scaler was fitted with. Every matrix that
/// crosses the scaler or the model uses this order.
pub const FEATURE_COLUMNS: [&str; 2] = ["volume_out", "volume_in"];

/// Traffic direction as recorded by the counting station.
///
/// The store encodes `0` as outbound and `1` as inbound. Any other code is
/// kept as `Other` so it can be carried through retrieval and ignored when
/// rows are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Out,
    In,
    Other(i64),
}

impl Direction {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Direction::Out,
            1 => Direction::In,
            other => Direction::Other(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Direction::Out => 0,
            Direction::In => 1,
            Direction::Other(code) => code,
        }
    }
}

/// A single count observation as fetched from the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub volume: u64,
    pub location: String,
}

/// Per-direction values in fit order.
///
/// Used for raw volumes, scaled features and model outputs alike so the
/// out/in pairing never depends on a positional index outside this type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumePair {
    pub volume_out: f64,
    pub volume_in: f64,
}

impl VolumePair {
    pub fn new(volume_out: f64, volume_in: f64) -> Self {
        Self { volume_out, volume_in }
    }

    /// Flatten into a feature row ordered as [`FEATURE_COLUMNS`].
    pub fn to_row(self) -> Vec<f64> {
        vec![self.volume_out, self.volume_in]
    }

    /// Rebuild from a feature row ordered as [`FEATURE_COLUMNS`].
    /// Returns `None` when the row does not have exactly two columns.
    pub fn from_row(row: &[f64]) -> Option<Self> {
        match row {
            [volume_out, volume_in] => Some(Self::new(*volume_out, *volume_in)),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.volume_out.is_finite() && self.volume_in.is_finite()
    }
}

/// One aggregated time bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBinRow {
    pub timestamp: DateTime<Utc>,
    pub volumes: VolumePair,
}

/// The most recent `W` time bins, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWindow {
    rows: Vec<TimeBinRow>,
}

impl FeatureWindow {
    /// Only the window builder constructs windows, which guarantees the
    /// length and ordering invariants.
    pub(crate) fn new(rows: Vec<TimeBinRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[TimeBinRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn values(&self) -> Vec<VolumePair> {
        self.rows.iter().map(|row| row.volumes).collect()
    }
}

/// A feature window after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledWindow {
    pub steps: Vec<VolumePair>,
}

/// A single normalized model output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledForecast(pub VolumePair);

/// Forecast value for one direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionForecast {
    pub value: f64,
    pub category: Category,
}

/// Result of one pipeline run. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub location: String,
    pub volume_in: DirectionForecast,
    pub volume_out: DirectionForecast,
}
