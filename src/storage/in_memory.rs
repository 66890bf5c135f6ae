//! In-memory object store for tests and dry runs

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::info;

use super::object_store::read_local_file;
use super::{BucketCreation, ObjectStore, StorageError};

type Buckets = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// Keeps buckets and blobs in a map guarded by an `RwLock`.
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    buckets: Arc<RwLock<Buckets>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_blob(&self, bucket: &str, blob: &str) -> Result<Vec<u8>, StorageError> {
        let buckets = self.read()?;
        let blobs = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })?;

        blobs
            .get(blob)
            .cloned()
            .ok_or_else(|| StorageError::BlobNotFound {
                bucket: bucket.to_string(),
                blob: blob.to_string(),
            })
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Buckets>, StorageError> {
        self.buckets.read().map_err(|e| StorageError::Request {
            status: None,
            message: format!("Failed to acquire read lock: {}", e),
        })
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Buckets>, StorageError> {
        self.buckets.write().map_err(|e| StorageError::Request {
            status: None,
            message: format!("Failed to acquire write lock: {}", e),
        })
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn create_bucket(&self, bucket: &str) -> Result<BucketCreation, StorageError> {
        let mut buckets = self.write()?;

        if buckets.contains_key(bucket) {
            info!("Bucket {} already exists.", bucket);
            return Ok(BucketCreation::AlreadyExisted);
        }

        buckets.insert(bucket.to_string(), BTreeMap::new());
        info!("Bucket {} created successfully.", bucket);
        Ok(BucketCreation::Created)
    }

    async fn upload_blob(
        &self,
        bucket: &str,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<(), StorageError> {
        let data = read_local_file(local_path).await?;

        let mut buckets = self.write()?;
        let blobs = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })?;
        blobs.insert(remote_path.to_string(), data);

        info!(
            "{} uploaded to {} in bucket {}.",
            local_path.display(),
            remote_path,
            bucket
        );
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read()?.keys().cloned().collect())
    }

    async fn list_blobs(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let buckets = self.read()?;
        buckets
            .get(bucket)
            .map(|blobs| blobs.keys().cloned().collect())
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })
    }

    async fn delete_blob(&self, bucket: &str, blob: &str) -> Result<(), StorageError> {
        let mut buckets = self.write()?;
        let blobs = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })?;

        blobs
            .remove(blob)
            .map(|_| ())
            .ok_or_else(|| StorageError::BlobNotFound {
                bucket: bucket.to_string(),
                blob: blob.to_string(),
            })
    }

    async fn delete_bucket(&self, bucket: &str, force: bool) -> Result<(), StorageError> {
        let mut buckets = self.write()?;

        match buckets.get(bucket) {
            None => {
                return Err(StorageError::BucketNotFound {
                    bucket: bucket.to_string(),
                });
            }
            Some(blobs) if !blobs.is_empty() && !force => {
                return Err(StorageError::BucketNotEmpty {
                    bucket: bucket.to_string(),
                });
            }
            Some(_) => {}
        }

        buckets.remove(bucket);
        info!("Bucket '{}' deleted successfully.", bucket);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn local_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_bucket_lifecycle() {
        let store = InMemoryObjectStore::new();

        assert_eq!(
            store.create_bucket("orders").await.unwrap(),
            BucketCreation::Created
        );
        assert_eq!(
            store.create_bucket("orders").await.unwrap(),
            BucketCreation::AlreadyExisted
        );
        assert_eq!(store.list_buckets().await.unwrap(), vec!["orders"]);

        let file = local_csv("Order_Id\nabc\n");
        store
            .upload_blob("orders", file.path(), "raw/orders.csv")
            .await
            .unwrap();
        assert_eq!(
            store.list_blobs("orders").await.unwrap(),
            vec!["raw/orders.csv"]
        );
        assert_eq!(
            store.get_blob("orders", "raw/orders.csv").unwrap(),
            b"Order_Id\nabc\n".to_vec()
        );

        store.delete_blob("orders", "raw/orders.csv").await.unwrap();
        assert!(store.list_blobs("orders").await.unwrap().is_empty());

        store.delete_bucket("orders", false).await.unwrap();
        assert!(store.list_buckets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_distinguishable() {
        let store = InMemoryObjectStore::new();
        let file = local_csv("x\n");

        assert!(matches!(
            store.upload_blob("missing", file.path(), "a.csv").await,
            Err(StorageError::BucketNotFound { .. })
        ));

        store.create_bucket("orders").await.unwrap();
        assert!(matches!(
            store.delete_blob("orders", "nope.csv").await,
            Err(StorageError::BlobNotFound { .. })
        ));
        assert!(matches!(
            store
                .upload_blob("orders", Path::new("/definitely/not/here.csv"), "a.csv")
                .await,
            Err(StorageError::LocalFile { .. })
        ));
    }

    #[tokio::test]
    async fn test_force_delete_non_empty_bucket() {
        let store = InMemoryObjectStore::new();
        let file = local_csv("x\n");
        store.create_bucket("orders").await.unwrap();
        store
            .upload_blob("orders", file.path(), "a.csv")
            .await
            .unwrap();

        assert!(matches!(
            store.delete_bucket("orders", false).await,
            Err(StorageError::BucketNotEmpty { .. })
        ));
        store.delete_bucket("orders", true).await.unwrap();
        assert!(matches!(
            store.list_blobs("orders").await,
            Err(StorageError::BucketNotFound { .. })
        ));
    }
}
