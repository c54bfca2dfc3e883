use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading or writing records.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid record path: {0}")]
    InvalidPath(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Blob service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A stored blob as reported by `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntry {
    /// Backend-specific handle accepted by `get`.
    pub id: String,
    /// Slash-separated path relative to the store root, e.g. `sessions/session_a_....json`.
    pub path: String,
}

impl BlobEntry {
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Minimal key-value file store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    fn name(&self) -> &str;

    /// Writes a new blob and returns its id.
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Lists blobs whose path starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, StorageError>;

    async fn get(&self, id: &str) -> Result<Vec<u8>, StorageError>;
}

/// Rejects absolute paths and parent-directory segments.
pub(crate) fn validate_relative_path(path: &str) -> Result<(), StorageError> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if bad {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths() {
        assert!(validate_relative_path("sessions/session_a_1.json").is_ok());
        assert!(validate_relative_path("file.json").is_ok());
        assert!(validate_relative_path("").is_err());
        assert!(validate_relative_path("/etc/passwd").is_err());
        assert!(validate_relative_path("sessions/../../x").is_err());
        assert!(validate_relative_path("sessions//x").is_err());
        assert!(validate_relative_path("a\\b").is_err());
    }

    #[test]
    fn entry_file_name() {
        let entry = BlobEntry {
            id: "1".to_string(),
            path: "sessions/session_a.json".to_string(),
        };
        assert_eq!(entry.file_name(), "session_a.json");
    }
}
