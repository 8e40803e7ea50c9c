//! Reading project documents and runtime overlays from disk.

use std::path::Path;

use courier_domain::{Project, RuntimeVariables};
use tokio::fs;

use crate::serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

/// Error type for document file operations.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The file could not be read or written.
    #[error("{path}: {source}")]
    Io {
        /// File involved.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file content is not a valid document.
    #[error("{path}: {source}")]
    Serialization {
        /// File involved.
        path: String,
        /// Underlying error.
        source: SerializationError,
    },
}

impl DocumentError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn serialization(path: &Path, source: SerializationError) -> Self {
        Self::Serialization {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Loads a project document.
///
/// # Errors
///
/// Returns an error if the file is missing or malformed.
pub async fn load_project(path: &Path) -> Result<Project, DocumentError> {
    let bytes = fs::read(path).await.map_err(|e| DocumentError::io(path, e))?;
    from_json_bytes(&bytes).map_err(|e| DocumentError::serialization(path, e))
}

/// Loads a runtime overlay. A missing file is an empty overlay.
///
/// # Errors
///
/// Returns an error if the file exists but is unreadable or malformed.
pub async fn load_runtime(path: &Path) -> Result<RuntimeVariables, DocumentError> {
    if !fs::try_exists(path).await.map_err(|e| DocumentError::io(path, e))? {
        return Ok(RuntimeVariables::new());
    }
    let bytes = fs::read(path).await.map_err(|e| DocumentError::io(path, e))?;
    from_json_bytes(&bytes).map_err(|e| DocumentError::serialization(path, e))
}

/// Writes a runtime overlay as stable JSON.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub async fn save_runtime(path: &Path, runtime: &RuntimeVariables) -> Result<(), DocumentError> {
    let bytes = to_json_stable_bytes(runtime).map_err(|e| DocumentError::serialization(path, e))?;
    fs::write(path, bytes).await.map_err(|e| DocumentError::io(path, e))
}
