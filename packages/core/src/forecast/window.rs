//! Window Builder
//!
//! Collapses raw per-direction count records into one row per time bin and
//! cuts the most recent fixed-length window out of them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::forecast::{
    error::WindowError,
    types::{Direction, FeatureWindow, RawRecord, TimeBinRow, VolumePair},
};

/// Builds fixed-length feature windows from raw records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBuilder {
    size: usize,
}

impl WindowBuilder {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Sum volumes per (timestamp, direction) and emit one row per distinct
    /// timestamp, oldest first. A direction absent for a timestamp yields 0.
    /// Records with a direction other than in/out do not contribute.
    pub fn aggregate(records: &[RawRecord]) -> Vec<TimeBinRow> {
        let mut bins: BTreeMap<DateTime<Utc>, (u64, u64)> = BTreeMap::new();

        for record in records {
            let slot = match record.direction {
                Direction::Out => 0,
                Direction::In => 1,
                Direction::Other(_) => continue,
            };
            let entry = bins.entry(record.timestamp).or_insert((0, 0));
            if slot == 0 {
                entry.0 = entry.0.saturating_add(record.volume);
            } else {
                entry.1 = entry.1.saturating_add(record.volume);
            }
        }

        bins.into_iter()
            .map(|(timestamp, (out, inbound))| TimeBinRow {
                timestamp,
                volumes: VolumePair::new(out as f64, inbound as f64),
            })
            .collect()
    }

    /// Build the most recent window. Records may arrive in any order.
    pub fn build(&self, records: &[RawRecord]) -> Result<FeatureWindow, WindowError> {
        if records.is_empty() {
            return Err(WindowError::NoData);
        }

        let rows = Self::aggregate(records);
        if rows.len() < self.size {
            return Err(WindowError::InsufficientHistory {
                required: self.size,
                available: rows.len(),
            });
        }

        let skip = rows.len() - self.size;
        Ok(FeatureWindow::new(rows.into_iter().skip(skip).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn record(minute: i64, direction: Direction, volume: u64) -> RawRecord {
        RawRecord {
            timestamp: at(minute),
            direction,
            volume,
            location: "gate-a".to_string(),
        }
    }

    fn full_bins(count: i64) -> Vec<RawRecord> {
        (0..count)
            .flat_map(|i| {
                vec![
                    record(i * 15, Direction::Out, 100 + i as u64),
                    record(i * 15, Direction::In, 200 + i as u64),
                ]
            })
            .collect()
    }

    #[test]
    fn empty_input_is_no_data() {
        let builder = WindowBuilder::new(6);
        assert_eq!(builder.build(&[]), Err(WindowError::NoData));
    }

    #[test]
    fn fewer_bins_than_window_is_insufficient() {
        let builder = WindowBuilder::new(6);
        let err = builder.build(&full_bins(3)).unwrap_err();
        assert_eq!(
            err,
            WindowError::InsufficientHistory { required: 6, available: 3 }
        );
    }

    #[test]
    fn twelve_records_make_a_full_window() {
        let builder = WindowBuilder::new(6);
        let window = builder.build(&full_bins(6)).unwrap();

        assert_eq!(window.len(), 6);
        assert_eq!(window.rows()[0].timestamp, at(0));
        assert_eq!(window.rows().last().unwrap().volumes, VolumePair::new(105.0, 205.0));
    }

    #[test]
    fn window_keeps_most_recent_rows_in_chronological_order() {
        let builder = WindowBuilder::new(6);
        let mut records = full_bins(9);
        records.reverse(); // store hands them out newest first

        let window = builder.build(&records).unwrap();
        let stamps: Vec<_> = window.rows().iter().map(|r| r.timestamp).collect();
        let expected: Vec<_> = (3..9).map(|i| at(i * 15)).collect();
        assert_eq!(stamps, expected);
    }

    #[test]
    fn missing_direction_is_zero_filled() {
        let records = vec![
            record(0, Direction::Out, 40),
            record(15, Direction::In, 70),
        ];
        let rows = WindowBuilder::aggregate(&records);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].volumes, VolumePair::new(40.0, 0.0));
        assert_eq!(rows[1].volumes, VolumePair::new(0.0, 70.0));
    }

    #[test]
    fn duplicate_direction_entries_are_summed() {
        let records = vec![
            record(0, Direction::In, 10),
            record(0, Direction::In, 15),
            record(0, Direction::Out, 3),
        ];
        let rows = WindowBuilder::aggregate(&records);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].volumes, VolumePair::new(3.0, 25.0));
    }

    #[test]
    fn unknown_directions_do_not_contribute() {
        let records = vec![
            record(0, Direction::Out, 5),
            record(0, Direction::Other(7), 999),
            record(15, Direction::Other(2), 50),
        ];
        let rows = WindowBuilder::aggregate(&records);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].volumes, VolumePair::new(5.0, 0.0));
    }

    #[test]
    fn one_direction_only_timestamps_count_toward_history() {
        let builder = WindowBuilder::new(6);
        let records: Vec<_> = (0..6).map(|i| record(i * 15, Direction::In, 10)).collect();

        let window = builder.build(&records).unwrap();
        assert!(window.values().iter().all(|v| v.volume_out == 0.0));
    }
}
