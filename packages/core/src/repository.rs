//! Database repository for traffic count records.
//!
//! [`TrafficRepository`] is the production [`RecordStore`]: it reads the
//! most recent in/out rows for a location from the `traffic_data` table.
//! Each query checks a connection out of the pool and returns it when the
//! query future completes, on success and failure alike.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{AnyPool, Row};

use crate::forecast::{
    error::StoreError,
    store::{RecordStore, StoreResult},
    types::{Direction, RawRecord},
};

/// Timestamp layout used when writing `time_bin` as text. Matches the text
/// form Postgres produces for `timestamp` columns, so both sort the same.
const TIME_BIN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Latest rows for a location, ordered on the stored instant. Postgres sorts
/// the `timestamp` column directly, which can use an index on `time_bin`.
const RECENT_POSTGRES: &str = "SELECT CAST(time_bin AS TEXT) AS time_bin_text,
        CAST(direction AS BIGINT) AS direction,
        CAST(volume AS BIGINT) AS volume
 FROM traffic_data
 WHERE location = $1 AND direction IN (0, 1)
 ORDER BY traffic_data.time_bin DESC
 LIMIT $2";

/// SQLite keeps `time_bin` as text, so the sort key is the parsed instant.
/// `julianday` normalizes UTC offsets in the stored text.
const RECENT_SQLITE: &str = "SELECT CAST(time_bin AS TEXT) AS time_bin_text,
        CAST(direction AS BIGINT) AS direction,
        CAST(volume AS BIGINT) AS volume
 FROM traffic_data
 WHERE location = $1 AND direction IN (0, 1)
 ORDER BY julianday(traffic_data.time_bin) DESC
 LIMIT $2";

/// Repository for reading traffic counts.
pub struct TrafficRepository {
    pool: AnyPool,
    recent_query: &'static str,
}

impl TrafficRepository {
    pub fn new(pool: AnyPool) -> Self {
        let is_sqlite = pool
            .connect_options()
            .database_url
            .scheme()
            .starts_with("sqlite");
        let recent_query = if is_sqlite { RECENT_SQLITE } else { RECENT_POSTGRES };
        Self { pool, recent_query }
    }

    /// Bulk-insert records in a single transaction.
    /// Used to seed SQLite databases; `time_bin` is written as text.
    pub async fn insert_records(&self, records: &[RawRecord]) -> Result<(), sqlx::Error> {
        if records.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for record in records {
            let time_bin = record.timestamp.format(TIME_BIN_FORMAT).to_string();
            let volume = i64::try_from(record.volume).unwrap_or(i64::MAX);

            sqlx::query(
                "INSERT INTO traffic_data (time_bin, direction, volume, location)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(time_bin)
            .bind(record.direction.code())
            .bind(volume)
            .bind(record.location.clone())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn query_recent(&self, location: &str, limit: usize) -> StoreResult<Vec<RawRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query(self.recent_query)
        .bind(location.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> StoreResult<RawRecord> {
                let time_bin: String = row.try_get("time_bin_text")?;
                let direction: i64 = row.try_get("direction")?;
                let volume: i64 = row.try_get("volume")?;

                let timestamp = parse_time_bin(&time_bin).ok_or_else(|| StoreError::Decode {
                    message: format!("unparseable time_bin '{time_bin}'"),
                })?;
                let volume = u64::try_from(volume).map_err(|_| StoreError::Decode {
                    message: format!("negative volume {volume} at {time_bin}"),
                })?;

                Ok(RawRecord {
                    timestamp,
                    direction: Direction::from_code(direction),
                    volume,
                    location: location.to_string(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl RecordStore for TrafficRepository {
    async fn fetch_recent(&self, location: &str, limit: usize) -> StoreResult<Vec<RawRecord>> {
        self.query_recent(location, limit).await
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn store_name(&self) -> &str {
        "traffic_data"
    }
}

/// Parse the text form of a `time_bin` column.
///
/// Accepts RFC 3339, Postgres `timestamptz` text (`2024-05-01 08:15:00+00`)
/// and naive timestamps, which are taken as UTC.
pub fn parse_time_bin(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(ts) = DateTime::parse_from_str(raw, format) {
            return Some(ts.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts.and_utc());
        }
    }
    None
}
