//! Object storage for uploaded files.
//!
//! Handlers only talk to [`ObjectStorage`]; production uses [`r2::R2Storage`]
//! against a Cloudflare R2 bucket through the S3 API.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod r2;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to presign request: {0}")]
    Presign(String),
    #[error("storage request failed: {0}")]
    Request(String),
    #[error("object `{0}` does not exist")]
    NotFound(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresignedUpload {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

pub struct ObjectBody {
    pub content_length: Option<i64>,
    pub body: Body,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Time-limited URL the browser can `PUT` the file body to.
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        content_length: i64,
        expires_in: Duration,
    ) -> Result<PresignedUpload, StorageError>;

    /// Size of a stored object, `None` when it does not exist.
    async fn object_size(&self, key: &str) -> Result<Option<i64>, StorageError>;

    async fn fetch(&self, key: &str) -> Result<ObjectBody, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

pub fn expiry_after(expires_in: Duration) -> DateTime<Utc> {
    let expires_in = chrono::Duration::from_std(expires_in).unwrap_or(chrono::Duration::zero());
    Utc::now() + expires_in
}
