//! Property-based tests for the forecasting pipeline
//!
//! Covers the window builder invariants and the scaler round-trip law over
//! generated inputs.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::forecast::{
    classifier::{classify, Category},
    error::WindowError,
    scaler::{MinMaxScaler, ScalerArtifact},
    types::{Direction, RawRecord, ScaledForecast, TimeBinRow},
    window::WindowBuilder,
};

const WINDOW: usize = 6;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![
        4 => Just(Direction::Out),
        4 => Just(Direction::In),
        1 => (2i64..10).prop_map(Direction::Other),
    ]
}

/// Records spread over at most `max_bins` distinct 15-minute bins.
fn records_strategy(max_bins: i64) -> impl Strategy<Value = Vec<RawRecord>> {
    prop::collection::vec(
        (0..max_bins, direction_strategy(), 0u64..5_000),
        0..40,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .map(|(bin, direction, volume)| RawRecord {
                timestamp: base() + Duration::minutes(15 * bin),
                direction,
                volume,
                location: "prop".into(),
            })
            .collect()
    })
}

/// Expand aggregated rows back into one record per direction.
fn flatten(rows: &[TimeBinRow]) -> Vec<RawRecord> {
    rows.iter()
        .flat_map(|row| {
            [
                (Direction::Out, row.volumes.volume_out),
                (Direction::In, row.volumes.volume_in),
            ]
            .map(|(direction, volume)| RawRecord {
                timestamp: row.timestamp,
                direction,
                volume: volume as u64,
                location: "prop".into(),
            })
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_rows_are_unique_and_ascending(records in records_strategy(20)) {
        let rows = WindowBuilder::aggregate(&records);
        for pair in rows.windows(2) {
            prop_assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn prop_fewer_bins_than_window_is_insufficient(records in records_strategy(WINDOW as i64 - 1)) {
        let result = WindowBuilder::new(WINDOW).build(&records);
        if records.is_empty() {
            prop_assert_eq!(result, Err(WindowError::NoData));
        } else {
            let is_insufficient = matches!(result, Err(WindowError::InsufficientHistory { .. }));
            prop_assert!(is_insufficient);
        }
    }

    #[test]
    fn prop_aggregation_is_idempotent(records in records_strategy(20)) {
        let rows = WindowBuilder::aggregate(&records);
        let again = WindowBuilder::aggregate(&flatten(&rows));
        prop_assert_eq!(rows, again);
    }

    #[test]
    fn prop_total_in_out_volume_is_preserved(records in records_strategy(20)) {
        let rows = WindowBuilder::aggregate(&records);
        let expected: u64 = records
            .iter()
            .filter(|r| !matches!(r.direction, Direction::Other(_)))
            .map(|r| r.volume)
            .sum();
        let actual: f64 = rows
            .iter()
            .map(|r| r.volumes.volume_out + r.volumes.volume_in)
            .sum();
        prop_assert_eq!(actual, expected as f64);
    }

    #[test]
    fn prop_window_is_latest_rows(records in records_strategy(20)) {
        let rows = WindowBuilder::aggregate(&records);
        if let Ok(window) = WindowBuilder::new(WINDOW).build(&records) {
            prop_assert_eq!(window.len(), WINDOW);
            prop_assert_eq!(window.rows(), &rows[rows.len() - WINDOW..]);
        }
    }

    #[test]
    fn prop_scaler_round_trip(
        bounds in prop::collection::vec((0.0f64..1_000.0, 1.0f64..5_000.0), 2),
        fractions in prop::collection::vec(0.0f64..=1.0, 2),
    ) {
        let data_min: Vec<f64> = bounds.iter().map(|(lo, _)| *lo).collect();
        let data_max: Vec<f64> = bounds.iter().map(|(lo, span)| lo + span).collect();
        let scaler = MinMaxScaler::from_artifact(ScalerArtifact {
            feature_range: (0.0, 1.0),
            data_min: data_min.clone(),
            data_max: data_max.clone(),
            feature_names: None,
        }).unwrap();

        let row: Vec<f64> = fractions
            .iter()
            .enumerate()
            .map(|(i, f)| data_min[i] + f * (data_max[i] - data_min[i]))
            .collect();

        let scaled = scaler.transform(&[row.clone()]).unwrap();
        for v in &scaled[0] {
            prop_assert!(*v >= -1e-9 && *v <= 1.0 + 1e-9);
        }
        let restored = scaler.inverse_transform(&scaled).unwrap();
        for (a, b) in restored[0].iter().zip(&row) {
            prop_assert!((a - b).abs() < 1e-6, "{} vs {}", a, b);
        }
    }

    #[test]
    fn prop_last_window_row_survives_normalize_denormalize(
        bins in prop::collection::vec((0u64..=4_000, 0u64..=3_000), WINDOW..=WINDOW + 4),
    ) {
        let records: Vec<RawRecord> = bins
            .iter()
            .enumerate()
            .flat_map(|(bin, (out, inbound))| {
                [(Direction::Out, *out), (Direction::In, *inbound)].map(|(direction, volume)| {
                    RawRecord {
                        timestamp: base() + Duration::minutes(15 * bin as i64),
                        direction,
                        volume,
                        location: "prop".into(),
                    }
                })
            })
            .collect();
        let scaler = MinMaxScaler::from_artifact(ScalerArtifact {
            feature_range: (0.0, 1.0),
            data_min: vec![0.0, 0.0],
            data_max: vec![4_000.0, 3_000.0],
            feature_names: None,
        }).unwrap();

        let window = WindowBuilder::new(WINDOW).build(&records).unwrap();
        let scaled = scaler.normalize(&window).unwrap();
        let last_scaled = *scaled.steps.last().unwrap();
        let restored = scaler.denormalize(&ScaledForecast(last_scaled)).unwrap();

        let expected = *window.values().last().unwrap();
        let (out, inbound) = bins[bins.len() - 1];
        prop_assert_eq!(expected.volume_out, out as f64);
        prop_assert_eq!(expected.volume_in, inbound as f64);
        prop_assert!((restored.volume_out - expected.volume_out).abs() < 1e-6);
        prop_assert!((restored.volume_in - expected.volume_in).abs() < 1e-6);
    }

    #[test]
    fn prop_classify_is_total(volume in -5_000.0f64..5_000.0) {
        let category = classify(volume);
        let expected = if volume < 0.0 {
            Category::Undefined
        } else if volume <= 500.0 {
            Category::Light
        } else if volume <= 1100.0 {
            Category::Moderate
        } else if volume <= 2000.0 {
            Category::Heavy
        } else {
            Category::Undefined
        };
        prop_assert_eq!(category, expected);
    }
}
