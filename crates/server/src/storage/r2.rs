use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client as S3Client;
use axum::body::Body;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};

use crate::config::StorageConfig;
use crate::storage::{expiry_after, ObjectBody, ObjectStorage, PresignedUpload, StorageError};

/// R2 accepts any region name; `auto` is what Cloudflare documents.
const R2_REGION: &str = "auto";

pub struct R2Storage {
    client: S3Client,
    bucket: String,
}

impl R2Storage {
    pub async fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "studyvault-config",
        );
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(R2_REGION))
            .endpoint_url(config.endpoint_url())
            .credentials_provider(credentials)
            .load()
            .await;
        let client = S3Client::new(&aws_config);

        info!(bucket = %config.bucket, "object storage client initialized");

        Self {
            client,
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStorage for R2Storage {
    #[instrument(skip(self))]
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        content_length: i64,
        expires_in: Duration,
    ) -> Result<PresignedUpload, StorageError> {
        let presigning_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::Presign(e.to_string()))?;
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(content_length)
            .presigned(presigning_config)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;
        Ok(PresignedUpload {
            url: presigned.uri().to_string(),
            expires_at: expiry_after(expires_in),
        })
    }

    #[instrument(skip(self))]
    async fn object_size(&self, key: &str) -> Result<Option<i64>, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => Ok(Some(output.content_length().unwrap_or_default())),
            Err(e) => {
                let e = e.into_service_error();
                if e.is_not_found() {
                    debug!("object is missing from the bucket");
                    Ok(None)
                } else {
                    Err(StorageError::Request(e.to_string()))
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn fetch(&self, key: &str) -> Result<ObjectBody, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let e = e.into_service_error();
                if e.is_no_such_key() {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::Request(e.to_string())
                }
            })?;
        let content_length = output.content_length();
        let stream = ReaderStream::new(output.body.into_async_read());
        Ok(ObjectBody {
            content_length,
            body: Body::from_stream(stream),
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.into_service_error().to_string()))?;
        Ok(())
    }
}
