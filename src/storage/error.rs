use std::path::PathBuf;
use thiserror::Error;

/// Failures of object-storage operations, split so callers can tell a
/// configuration problem from a missing object or a flaky network.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Missing environment variable: {variable}")]
    MissingCredentials { variable: String },

    #[error("Invalid storage configuration: {0}")]
    InvalidConfig(String),

    #[error("Bucket '{bucket}' not found")]
    BucketNotFound { bucket: String },

    #[error("Blob '{blob}' not found in bucket '{bucket}'")]
    BlobNotFound { bucket: String, blob: String },

    #[error("Bucket '{bucket}' is not empty")]
    BucketNotEmpty { bucket: String },

    #[error("Failed to read local file {}: {source}", .path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage request failed (status {status:?}): {message}")]
    Request { status: Option<u16>, message: String },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::BucketNotFound { .. } | StorageError::BlobNotFound { .. }
        )
    }

    /// Transport failures and server-side errors; worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Request { status: None, .. } => true,
            StorageError::Request {
                status: Some(status),
                ..
            } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
