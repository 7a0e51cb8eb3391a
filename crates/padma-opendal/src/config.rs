//! Storage configuration types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::ObjectStore;
use crate::error::{StorageError, StorageResult};

/// Amazon S3 (or compatible) storage configuration.
///
/// All fields can be provided via command-line arguments or environment
/// variables when the `config` feature is enabled.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(clap::Args))]
pub struct StorageConfig {
    /// Bucket holding generated archives.
    #[cfg_attr(feature = "config", arg(long, env = "STORAGE_BUCKET"))]
    pub storage_bucket: String,

    /// AWS region of the bucket.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "STORAGE_REGION", default_value = "us-east-1")
    )]
    pub storage_region: String,

    /// Custom endpoint URL (for S3-compatible storage like MinIO or R2).
    #[cfg_attr(feature = "config", arg(long, env = "STORAGE_ENDPOINT"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_endpoint: Option<String>,

    /// Access key ID.
    #[cfg_attr(feature = "config", arg(long, env = "STORAGE_ACCESS_KEY_ID"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_access_key_id: Option<String>,

    /// Secret access key.
    #[cfg_attr(feature = "config", arg(long, env = "STORAGE_SECRET_ACCESS_KEY"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_secret_access_key: Option<String>,

    /// Path prefix within the bucket.
    #[cfg_attr(feature = "config", arg(long, env = "STORAGE_PREFIX"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_prefix: Option<String>,
}

impl StorageConfig {
    /// Creates a new storage configuration.
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            storage_bucket: bucket.into(),
            storage_region: region.into(),
            storage_endpoint: None,
            storage_access_key_id: None,
            storage_secret_access_key: None,
            storage_prefix: None,
        }
    }

    /// Sets the custom endpoint (for S3-compatible storage).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.storage_endpoint = Some(endpoint.into());
        self
    }

    /// Sets the access credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.storage_access_key_id = Some(access_key_id.into());
        self.storage_secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Sets the path prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = Some(prefix.into());
        self
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> StorageResult<()> {
        if self.storage_bucket.trim().is_empty() {
            return Err(StorageError::init("storage bucket must not be empty"));
        }

        if self.storage_region.trim().is_empty() {
            return Err(StorageError::init("storage region must not be empty"));
        }

        Ok(())
    }

    /// Validates the configuration and builds an [`ObjectStore`].
    pub async fn build(self) -> StorageResult<ObjectStore> {
        self.validate()?;
        ObjectStore::new(self).await
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("storage_bucket", &self.storage_bucket)
            .field("storage_region", &self.storage_region)
            .field("storage_endpoint", &self.storage_endpoint)
            .field("storage_access_key_id", &self.storage_access_key_id)
            .field(
                "storage_secret_access_key",
                &self.storage_secret_access_key.as_ref().map(|_| "***"),
            )
            .field("storage_prefix", &self.storage_prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = StorageConfig::new("archives", "eu-west-1")
            .with_endpoint("http://localhost:9000")
            .with_credentials("key", "secret")
            .with_prefix("downloads/");

        assert_eq!(config.storage_bucket, "archives");
        assert_eq!(config.storage_region, "eu-west-1");
        assert_eq!(config.storage_endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.storage_prefix.as_deref(), Some("downloads/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_bucket_rejected() {
        let config = StorageConfig::new("", "eu-west-1");
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_masks_secret() {
        let config = StorageConfig::new("archives", "eu-west-1").with_credentials("key", "hunter2");

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }
}
