//! Object store implementation.

use std::time::Duration;

use opendal::Operator;

use crate::TRACING_TARGET;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};

/// Result of probing an object's existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectProbe {
    /// Whether the object exists.
    pub exists: bool,
    /// Object size in bytes, when it exists.
    pub size: Option<u64>,
}

/// Time-limited URL granting read access to an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    /// The signed URL.
    pub url: String,
    /// How long the URL stays valid.
    pub expires_in: Duration,
}

/// Gateway to the bucket holding generated archives.
///
/// Wraps an OpenDAL operator and keeps the error taxonomy strict: a missing
/// object is reported through [`ObjectProbe::exists`], never conflated with
/// access or backend failures.
#[derive(Clone)]
pub struct ObjectStore {
    operator: Operator,
    config: StorageConfig,
}

impl ObjectStore {
    /// Creates a new object store from configuration.
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let operator = Self::create_operator(&config)?;

        tracing::info!(
            target: TRACING_TARGET,
            bucket = %config.storage_bucket,
            region = %config.storage_region,
            "Object store initialized"
        );

        Ok(Self { operator, config })
    }

    /// Creates an object store over an existing operator.
    ///
    /// Intended for tests and alternate wiring where the operator is built
    /// elsewhere, e.g. over the in-memory service.
    pub fn with_operator(operator: Operator, config: StorageConfig) -> Self {
        Self { operator, config }
    }

    /// Returns the configuration for this store.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Returns the bucket name.
    pub fn bucket(&self) -> &str {
        &self.config.storage_bucket
    }

    /// Probes whether an object exists, and its size when it does.
    ///
    /// Only an authoritative "no such object" answer from the backend yields
    /// `exists: false`; access and backend failures surface as errors so the
    /// caller never mistakes an outage for a vanished archive.
    pub async fn probe(&self, path: &str) -> StorageResult<ObjectProbe> {
        match self.operator.stat(path).await {
            Ok(meta) => Ok(ObjectProbe {
                exists: true,
                size: Some(meta.content_length()),
            }),
            Err(err) if err.kind() == opendal::ErrorKind::NotFound => Ok(ObjectProbe {
                exists: false,
                size: None,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Creates a time-limited download URL for an object.
    ///
    /// Backends without presign support yield [`StorageError::Unsupported`].
    pub async fn presign_read(&self, path: &str, ttl: Duration) -> StorageResult<PresignedUrl> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            ttl_secs = ttl.as_secs(),
            "Presigning read"
        );

        let request = self.operator.presign_read(path, ttl).await?;

        Ok(PresignedUrl {
            url: request.uri().to_string(),
            expires_in: ttl,
        })
    }

    /// Reads an object from storage.
    pub async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            "Reading object"
        );

        let data = self.operator.read(path).await?.to_vec();

        Ok(data)
    }

    /// Writes data to an object in storage.
    pub async fn write(&self, path: &str, data: &[u8]) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            size = data.len(),
            "Writing object"
        );

        self.operator.write(path, data.to_vec()).await?;

        Ok(())
    }

    /// Deletes an object from storage.
    ///
    /// Deleting an absent object succeeds, so cleanup passes can repeat
    /// safely.
    pub async fn delete(&self, path: &str) -> StorageResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            path = %path,
            "Deleting object"
        );

        match self.operator.delete(path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == opendal::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Lists object paths under a prefix.
    pub async fn list_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        use futures::TryStreamExt;

        let entries: Vec<_> = self.operator.lister(prefix).await?.try_collect().await?;

        Ok(entries.into_iter().map(|e| e.path().to_string()).collect())
    }

    /// Creates an OpenDAL operator based on configuration.
    #[cfg(feature = "s3")]
    fn create_operator(config: &StorageConfig) -> StorageResult<Operator> {
        let mut builder = opendal::services::S3::default()
            .bucket(&config.storage_bucket)
            .region(&config.storage_region);

        if let Some(ref endpoint) = config.storage_endpoint {
            builder = builder.endpoint(endpoint);
        }

        if let Some(ref access_key_id) = config.storage_access_key_id {
            builder = builder.access_key_id(access_key_id);
        }

        if let Some(ref secret_access_key) = config.storage_secret_access_key {
            builder = builder.secret_access_key(secret_access_key);
        }

        if let Some(ref prefix) = config.storage_prefix {
            builder = builder.root(prefix);
        }

        Operator::new(builder)
            .map(|op| op.finish())
            .map_err(|e| StorageError::init(e.to_string()))
    }

    #[cfg(not(feature = "s3"))]
    fn create_operator(_config: &StorageConfig) -> StorageResult<Operator> {
        Err(StorageError::unsupported(
            "no storage backend feature enabled",
        ))
    }
}

impl std::fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStore")
            .field("bucket", &self.config.storage_bucket)
            .field("region", &self.config.storage_region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> ObjectStore {
        let operator = Operator::new(opendal::services::Memory::default())
            .expect("memory operator")
            .finish();

        ObjectStore::with_operator(operator, StorageConfig::new("test-bucket", "local"))
    }

    #[tokio::test]
    async fn probe_distinguishes_present_from_absent() {
        let store = memory_store();
        store.write("archives/a.zip", b"zip bytes").await.unwrap();

        let present = store.probe("archives/a.zip").await.unwrap();
        assert!(present.exists);
        assert_eq!(present.size, Some(9));

        let absent = store.probe("archives/missing.zip").await.unwrap();
        assert!(!absent.exists);
        assert_eq!(absent.size, None);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = memory_store();
        store.write("archives/b.zip", b"data").await.unwrap();

        store.delete("archives/b.zip").await.unwrap();
        store.delete("archives/b.zip").await.unwrap();

        let probe = store.probe("archives/b.zip").await.unwrap();
        assert!(!probe.exists);
    }

    #[tokio::test]
    async fn list_prefix_returns_written_objects() {
        let store = memory_store();
        store.write("archives/r1/a.zip", b"a").await.unwrap();
        store.write("archives/r1/b.zip", b"b").await.unwrap();

        let mut paths = store.list_prefix("archives/r1/").await.unwrap();
        paths.sort();
        paths.retain(|p| !p.ends_with('/'));

        assert_eq!(paths, vec!["archives/r1/a.zip", "archives/r1/b.zip"]);
    }

    #[tokio::test]
    async fn presign_unsupported_on_memory_backend() {
        let store = memory_store();

        let err = store
            .presign_read("archives/a.zip", Duration::from_secs(3600))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Unsupported(_)));
    }
}
