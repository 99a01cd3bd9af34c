//! Loading of pre-fitted JSON artifacts from disk

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::forecast::error::ArtifactError;

/// Read and deserialize a JSON artifact.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reject empty or non-finite parameter vectors.
pub(crate) fn check_finite(name: &str, values: &[f64]) -> Result<(), ArtifactError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ArtifactError::invalid(format!("{name} contains non-finite values")))
    }
}
