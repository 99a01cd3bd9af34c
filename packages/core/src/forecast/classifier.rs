//! Congestion Category Classifier

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of the light band.
pub const LIGHT_MAX: f64 = 500.0;
/// Upper bound (inclusive) of the moderate band.
pub const MODERATE_MAX: f64 = 1100.0;
/// Upper bound (inclusive) of the heavy band.
pub const HEAVY_MAX: f64 = 2000.0;

/// Traffic congestion label for a single forecast volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Light,
    Moderate,
    Heavy,
    Undefined,
}

/// Map a volume to its congestion band.
///
/// Band boundaries belong to the lower band. Negative, NaN and values above
/// [`HEAVY_MAX`] are `Undefined`.
pub fn classify(volume: f64) -> Category {
    if volume.is_nan() || volume < 0.0 {
        Category::Undefined
    } else if volume <= LIGHT_MAX {
        Category::Light
    } else if volume <= MODERATE_MAX {
        Category::Moderate
    } else if volume <= HEAVY_MAX {
        Category::Heavy
    } else {
        Category::Undefined
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Light => "Light",
            Category::Moderate => "Moderate",
            Category::Heavy => "Heavy",
            Category::Undefined => "Undefined",
        };
        f.write_str(label)
    }
}
