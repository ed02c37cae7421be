use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobError;

/// Content type used for every rendered document.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Pluggable object storage backend (S3, in-memory, ...).
///
/// Backends are thin: key derivation, reference handling and result
/// translation live in [`StorageGateway`](crate::StorageGateway). Objects are
/// always written with private access.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` under `key`. Any non-success answer from the store is
    /// reported as [`BlobError::Rejected`] with its status.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), BlobError>;

    /// Check whether an object exists without downloading it.
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, BlobError>;

    /// Download an object. Returns `None` if it does not exist.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Bytes>, BlobError>;

    /// Delete an object.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), BlobError>;
}
