use async_trait::async_trait;
use std::path::Path;

use super::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketCreation {
    Created,
    AlreadyExisted,
}

/// Bucket and blob operations the pipeline needs from an object store.
///
/// Every call is independent; implementations hold no state between calls
/// beyond their connection settings.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Creating a bucket that already exists is not an error.
    async fn create_bucket(&self, bucket: &str) -> Result<BucketCreation, StorageError>;

    async fn upload_blob(
        &self,
        bucket: &str,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<(), StorageError>;

    async fn list_buckets(&self) -> Result<Vec<String>, StorageError>;

    async fn list_blobs(&self, bucket: &str) -> Result<Vec<String>, StorageError>;

    async fn delete_blob(&self, bucket: &str, blob: &str) -> Result<(), StorageError>;

    /// With `force`, every blob is removed first; without it a non-empty
    /// bucket yields [`StorageError::BucketNotEmpty`].
    async fn delete_bucket(&self, bucket: &str, force: bool) -> Result<(), StorageError>;
}

pub(crate) async fn read_local_file(path: &Path) -> Result<Vec<u8>, StorageError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| StorageError::LocalFile {
            path: path.to_path_buf(),
            source,
        })
}
