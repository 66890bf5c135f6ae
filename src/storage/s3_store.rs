use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use std::path::Path;
use tracing::{error, info, warn};

use super::object_store::read_local_file;
use super::{BucketCreation, ObjectStore, StorageError};
use crate::config::StorageConfig;

/// [`ObjectStore`] backed by any S3-compatible endpoint (MinIO, GCS interop,
/// AWS).
pub struct S3ObjectStore {
    region: Region,
    credentials: Credentials,
    path_style: bool,
}

impl S3ObjectStore {
    /// Fails with [`StorageError::MissingCredentials`] when the credential
    /// environment variables are not set.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let mut config = config.clone();
        if config.access_key.is_none() || config.secret_key.is_none() {
            config.load_credentials()?;
        }
        config.validate()?;

        let region = Region::Custom {
            region: config.get_region().to_owned(),
            endpoint: config.endpoint.clone(),
        };

        let credentials = Credentials::new(
            Some(config.get_access_key()?),
            Some(config.get_secret_key()?),
            None, // security_token
            None, // session_token
            None, // expiration
        )
        .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;

        info!(
            "Using object storage at {} (region {})",
            config.endpoint,
            config.get_region()
        );

        Ok(S3ObjectStore {
            region,
            credentials,
            path_style: config.is_path_style(),
        })
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>, StorageError> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())
            .map_err(request_error)?;

        // Path-style addressing is required for MinIO
        Ok(if self.path_style {
            bucket.with_path_style()
        } else {
            bucket
        })
    }

    async fn ensure_bucket_exists(&self, bucket: &Bucket) -> Result<(), StorageError> {
        match bucket.exists().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(StorageError::BucketNotFound {
                bucket: bucket.name.clone(),
            }),
            Err(e) => Err(request_error(e)),
        }
    }

    pub async fn put_bytes(
        &self,
        bucket_name: &str,
        remote_path: &str,
        data: &[u8],
    ) -> Result<(), StorageError> {
        let bucket = self.bucket(bucket_name)?;
        self.ensure_bucket_exists(&bucket).await?;

        let response = bucket
            .put_object(remote_path, data)
            .await
            .map_err(request_error)?;

        if response.status_code() == 200 {
            Ok(())
        } else {
            Err(StorageError::Request {
                status: Some(response.status_code()),
                message: format!("Failed to store object {}", remote_path),
            })
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn create_bucket(&self, bucket_name: &str) -> Result<BucketCreation, StorageError> {
        let bucket = self.bucket(bucket_name)?;

        match bucket.exists().await {
            Ok(true) => {
                info!("Bucket {} already exists.", bucket_name);
                return Ok(BucketCreation::AlreadyExisted);
            }
            Ok(false) => {}
            Err(e) => {
                error!("Failed to check bucket existence: {}", e);
                return Err(request_error(e));
            }
        }

        let config = s3::BucketConfiguration::default();
        let response = if self.path_style {
            Bucket::create_with_path_style(
                bucket_name,
                self.region.clone(),
                self.credentials.clone(),
                config,
            )
            .await
        } else {
            Bucket::create(
                bucket_name,
                self.region.clone(),
                self.credentials.clone(),
                config,
            )
            .await
        };

        match response {
            Ok(_) => {
                info!("Bucket {} created successfully.", bucket_name);
                Ok(BucketCreation::Created)
            }
            Err(e) => {
                error!("Failed to create bucket {}: {}", bucket_name, e);
                Err(request_error(e))
            }
        }
    }

    async fn upload_blob(
        &self,
        bucket_name: &str,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<(), StorageError> {
        let data = read_local_file(local_path).await?;
        self.put_bytes(bucket_name, remote_path, &data).await?;

        info!(
            "{} uploaded to {} in bucket {}.",
            local_path.display(),
            remote_path,
            bucket_name
        );
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<String>, StorageError> {
        let response = Bucket::list_buckets(self.region.clone(), self.credentials.clone())
            .await
            .map_err(request_error)?;

        let names: Vec<String> = response.bucket_names().collect();
        if names.is_empty() {
            info!("No buckets found.");
        }
        Ok(names)
    }

    async fn list_blobs(&self, bucket_name: &str) -> Result<Vec<String>, StorageError> {
        let bucket = self.bucket(bucket_name)?;
        self.ensure_bucket_exists(&bucket).await?;

        let list = bucket
            .list(String::new(), None)
            .await
            .map_err(request_error)?;

        let mut blob_names = Vec::new();
        for result in list {
            for object in result.contents {
                blob_names.push(object.key);
            }
        }

        blob_names.sort();
        Ok(blob_names)
    }

    async fn delete_blob(&self, bucket_name: &str, blob: &str) -> Result<(), StorageError> {
        let bucket = self.bucket(bucket_name)?;

        // S3 answers 204 for missing keys too, so look first
        match bucket.head_object(blob).await {
            Ok(_) => {}
            Err(e) => {
                return Err(match request_error(e) {
                    StorageError::Request {
                        status: Some(404), ..
                    } => StorageError::BlobNotFound {
                        bucket: bucket_name.to_string(),
                        blob: blob.to_string(),
                    },
                    other => other,
                });
            }
        }

        let response = bucket.delete_object(blob).await.map_err(request_error)?;

        if response.status_code() == 204 || response.status_code() == 200 {
            info!("Blob '{}' deleted from bucket '{}'.", blob, bucket_name);
            Ok(())
        } else {
            Err(StorageError::Request {
                status: Some(response.status_code()),
                message: format!("Failed to delete blob {}", blob),
            })
        }
    }

    async fn delete_bucket(&self, bucket_name: &str, force: bool) -> Result<(), StorageError> {
        let blobs = self.list_blobs(bucket_name).await?;

        if !blobs.is_empty() {
            if !force {
                return Err(StorageError::BucketNotEmpty {
                    bucket: bucket_name.to_string(),
                });
            }
            warn!(
                "Force-deleting {} blobs from bucket '{}'",
                blobs.len(),
                bucket_name
            );
            for blob in &blobs {
                self.delete_blob(bucket_name, blob).await?;
            }
        }

        let bucket = self.bucket(bucket_name)?;
        bucket.delete().await.map_err(request_error)?;

        info!("Bucket '{}' deleted successfully.", bucket_name);
        Ok(())
    }
}

fn request_error(err: S3Error) -> StorageError {
    match err {
        S3Error::HttpFailWithBody(status, body) => StorageError::Request {
            status: Some(status),
            message: body,
        },
        other => StorageError::Request {
            status: None,
            message: other.to_string(),
        },
    }
}
