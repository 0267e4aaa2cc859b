use std::fs::read_to_string;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

use crate::database::connection::DbConfig;

const MIN_SESSION_SECRET_LEN: usize = 32;
/// S3-style presigned URLs are valid for at most a week.
const MAX_PRESIGN_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub address: String,
}

/// Credentials for the R2 bucket holding uploaded files.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            bucket: String::new(),
            presign_expiry_secs: default_presign_expiry_secs(),
        }
    }
}

impl StorageConfig {
    pub fn endpoint_url(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }

    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_session_max_age_days")]
    pub max_age_days: i64,
    #[serde(default)]
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            max_age_days: default_session_max_age_days(),
            secure: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: i64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_presign_expiry_secs() -> u64 {
    600
}

fn default_session_max_age_days() -> i64 {
    30
}

fn default_max_file_size() -> i64 {
    50 * 1024 * 1024
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DbConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
}

impl AppConfig {
    pub fn from_yaml_file<P: Into<PathBuf>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.into();
        let content = read_to_string(&path).with_context(|| format!("path: {path:?}"))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, anyhow::Error> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Secrets normally come from the environment rather than the config file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets = [
            ("SESSION_SECRET", &mut self.session.secret),
            ("R2_ACCOUNT_ID", &mut self.storage.account_id),
            ("R2_ACCESS_KEY_ID", &mut self.storage.access_key_id),
            ("R2_SECRET_ACCESS_KEY", &mut self.storage.secret_access_key),
            ("R2_BUCKET_NAME", &mut self.storage.bucket),
        ];
        for (key, target) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        ensure!(
            self.session.secret.len() >= MIN_SESSION_SECRET_LEN,
            "session secret must be at least {MIN_SESSION_SECRET_LEN} bytes long"
        );
        ensure!(
            self.session.max_age_days > 0,
            "session max_age_days must be positive"
        );
        ensure!(
            self.uploads.max_file_size > 0,
            "uploads max_file_size must be positive"
        );
        let storage = &self.storage;
        ensure!(
            (1..=MAX_PRESIGN_EXPIRY_SECS).contains(&storage.presign_expiry_secs),
            "storage presign_expiry_secs must be between 1 and {MAX_PRESIGN_EXPIRY_SECS}"
        );
        for (name, value) in [
            ("account id", &storage.account_id),
            ("access key id", &storage.access_key_id),
            ("secret access key", &storage.secret_access_key),
            ("bucket", &storage.bucket),
        ] {
            ensure!(!value.is_empty(), "storage {name} is not configured");
        }
        Ok(())
    }
}
