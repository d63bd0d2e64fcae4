//! Structured data file reading
//!
//! Manifests, templates and configuration may be written as JSON or RON; the
//! format is picked from the file extension (`.ron` is RON, anything else JSON).

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

/// Read and deserialize a JSON or RON file
///
/// # Errors
///
/// Returns an error if the file cannot be read or deserialization fails
pub fn read_structured<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, DataError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| DataError::Io(e.to_string()))?;

    if is_ron(path) {
        ron::from_str(&content).map_err(|e| DataError::Parse(e.to_string()))
    } else {
        serde_json::from_str(&content).map_err(|e| DataError::Parse(e.to_string()))
    }
}

fn is_ron(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ron"))
}

/// Errors that can occur while reading a structured data file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// IO error
    Io(String),
    /// Deserialization error
    Parse(String),
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for DataError {}
