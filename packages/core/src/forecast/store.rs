//! Record Store Interface
//!
//! Abstraction over the source of raw traffic counts

use async_trait::async_trait;

use crate::forecast::{error::StoreError, types::RawRecord};

/// Source of timestamped per-direction count records.
#[async_trait]
pub trait RecordStore {
    /// Fetch up to `limit` most recent in/out records for `location`,
    /// newest first.
    async fn fetch_recent(
        &self,
        location: &str,
        limit: usize,
    ) -> Result<Vec<RawRecord>, StoreError>;

    /// Cheap reachability probe used by the diagnostics endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Name of this backend for logging
    fn store_name(&self) -> &str;
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
