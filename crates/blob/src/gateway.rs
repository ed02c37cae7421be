use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};
use vellum_core::{ApiResponse, ErrorKind};

use crate::error::BlobError;
use crate::reference::{ReferenceFormat, object_key};
use crate::store::{ObjectStore, PDF_CONTENT_TYPE};

/// Status reported when the store could not be reached at all.
const UNREACHABLE_STATUS: u16 = 502;

/// Stores rendered documents and resolves references back to objects.
///
/// All operations return an [`ApiResponse`]; backend errors are logged here
/// and never leave this type.
#[derive(Clone)]
pub struct StorageGateway {
    store: Arc<dyn ObjectStore>,
    format: ReferenceFormat,
}

impl StorageGateway {
    pub fn new(store: Arc<dyn ObjectStore>, format: ReferenceFormat) -> Self {
        Self { store, format }
    }

    pub fn format(&self) -> &ReferenceFormat {
        &self.format
    }

    /// Upload a PDF under today's date partition and return its reference.
    pub async fn store(&self, data: Bytes, file_name: &str) -> ApiResponse<String> {
        self.store_at(data, file_name, Utc::now()).await
    }

    /// Upload a PDF under the date partition of `at`.
    #[instrument(skip(self, data), fields(bucket = %self.format.bucket(), size = data.len()))]
    pub async fn store_at(
        &self,
        data: Bytes,
        file_name: &str,
        at: DateTime<Utc>,
    ) -> ApiResponse<String> {
        let key = object_key(file_name, at);
        match self
            .store
            .put(self.format.bucket(), &key, data, PDF_CONTENT_TYPE)
            .await
        {
            Ok(()) => {
                let reference = self.format.reference_for(&key);
                info!(key = %key, reference = %reference, "stored object");
                ApiResponse::success(reference)
            }
            Err(e) => {
                error!(key = %key, error = %e, "object upload failed");
                upload_failure(&e)
            }
        }
    }

    /// Delete the object behind `reference`.
    ///
    /// The existence check and the delete are separate round trips; an object
    /// removed by someone else in between is still reported as deleted.
    #[instrument(skip(self), fields(bucket = %self.format.bucket()))]
    pub async fn delete(&self, reference: &str) -> ApiResponse<()> {
        let key = match self.resolve(reference) {
            Ok(key) => key,
            Err(response) => return response,
        };

        match self.store.exists(self.format.bucket(), &key).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(key = %key, "object not found");
                return ApiResponse::not_found(format!("S3 object not found: {key}"))
                    .with_kind(ErrorKind::NotFound);
            }
            Err(e) => {
                error!(key = %key, error = %e, "existence check failed");
                return storage_failure(&e, "Failed to check S3 object");
            }
        }

        match self.store.delete(self.format.bucket(), &key).await {
            Ok(()) => {
                info!(key = %key, "deleted object");
                ApiResponse::ok()
            }
            Err(e) => {
                error!(key = %key, error = %e, "object delete failed");
                storage_failure(&e, "Failed to delete S3 object")
            }
        }
    }

    /// Download the object behind `reference`.
    #[instrument(skip(self), fields(bucket = %self.format.bucket()))]
    pub async fn fetch(&self, reference: &str) -> ApiResponse<Bytes> {
        let key = match self.resolve(reference) {
            Ok(key) => key,
            Err(response) => return response,
        };

        match self.store.get(self.format.bucket(), &key).await {
            Ok(Some(data)) => ApiResponse::success(data),
            Ok(None) => ApiResponse::not_found(format!("S3 object not found: {key}"))
                .with_kind(ErrorKind::NotFound),
            Err(e) => {
                error!(key = %key, error = %e, "object download failed");
                storage_failure(&e, "Failed to read S3 object")
            }
        }
    }

    fn resolve<T>(&self, reference: &str) -> Result<String, ApiResponse<T>> {
        self.format.parse_reference(reference).map_err(|e| {
            warn!(reference = %reference, error = %e, "unparseable reference");
            ApiResponse::bad_request("Invalid S3 URL", Vec::new())
                .with_kind(ErrorKind::InvalidReference)
        })
    }
}

impl std::fmt::Debug for StorageGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageGateway")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

fn upload_failure<T>(e: &BlobError) -> ApiResponse<T> {
    match e.status() {
        Some(status) => ApiResponse::failure(
            format!("Failed to upload to S3. Status code: {status}"),
            status,
        ),
        None => ApiResponse::failure("Failed to upload to S3", UNREACHABLE_STATUS),
    }
    .with_kind(ErrorKind::StorageFailure)
}

fn storage_failure<T>(e: &BlobError, message: &str) -> ApiResponse<T> {
    let status = e.status().unwrap_or(UNREACHABLE_STATUS);
    ApiResponse::failure(message, status).with_kind(ErrorKind::StorageFailure)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::memory::MemoryObjectStore;

    fn gateway(store: &Arc<MemoryObjectStore>) -> StorageGateway {
        StorageGateway::new(
            Arc::clone(store) as Arc<dyn ObjectStore>,
            ReferenceFormat::new("docs", "us-east-1"),
        )
    }

    #[tokio::test]
    async fn store_returns_reference_and_writes_pdf() {
        let store = Arc::new(MemoryObjectStore::new());
        let gw = gateway(&store);
        let at = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();

        let resp = gw
            .store_at(Bytes::from_static(b"%PDF-1.7"), "a.pdf", at)
            .await;

        assert_eq!(resp.status_code(), 200);
        assert_eq!(
            resp.data().unwrap(),
            "https://docs.s3.amazonaws.com/documents/2024/02/29/a.pdf"
        );
        let object = store.object("docs", "documents/2024/02/29/a.pdf").unwrap();
        assert_eq!(object.content_type, PDF_CONTENT_TYPE);
        assert_eq!(object.data.as_ref(), b"%PDF-1.7");
    }

    #[tokio::test]
    async fn rejected_upload_carries_store_status() {
        let store = Arc::new(MemoryObjectStore::new());
        store.reject_puts_with(Some(403));
        let resp = gateway(&store).store(Bytes::from_static(b"x"), "a.pdf").await;

        assert!(!resp.is_success());
        assert_eq!(resp.status_code(), 403);
        assert_eq!(resp.kind(), Some(ErrorKind::StorageFailure));
        assert_eq!(
            resp.error().unwrap().message,
            "Failed to upload to S3. Status code: 403"
        );
    }

    #[tokio::test]
    async fn delete_removes_existing_object() {
        let store = Arc::new(MemoryObjectStore::new());
        let gw = gateway(&store);
        let reference = gw
            .store(Bytes::from_static(b"x"), "a.pdf")
            .await
            .into_data()
            .unwrap();

        let resp = gw.delete(&reference).await;
        assert!(resp.is_success());
        assert_eq!(store.delete_calls(), 1);
        assert_eq!(gw.fetch(&reference).await.kind(), Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn delete_with_unparseable_reference_issues_no_calls() {
        let store = Arc::new(MemoryObjectStore::new());
        let resp = gateway(&store).delete("https://example.com/elsewhere").await;

        assert_eq!(resp.status_code(), 400);
        assert_eq!(resp.kind(), Some(ErrorKind::InvalidReference));
        assert_eq!(resp.error().unwrap().message, "Invalid S3 URL");
        assert_eq!(store.exists_calls(), 0);
        assert_eq!(store.delete_calls(), 0);
    }

    #[tokio::test]
    async fn delete_of_absent_object_is_not_found() {
        let store = Arc::new(MemoryObjectStore::new());
        let resp = gateway(&store)
            .delete("https://docs.s3.amazonaws.com/documents/2024/01/01/missing.pdf")
            .await;

        assert_eq!(resp.status_code(), 404);
        assert_eq!(resp.kind(), Some(ErrorKind::NotFound));
        assert_eq!(
            resp.error().unwrap().message,
            "S3 object not found: documents/2024/01/01/missing.pdf"
        );
        assert_eq!(store.delete_calls(), 0);
    }

    #[tokio::test]
    async fn fetch_returns_stored_bytes() {
        let store = Arc::new(MemoryObjectStore::new());
        let gw = gateway(&store);
        let reference = gw
            .store(Bytes::from_static(b"%PDF body"), "b.pdf")
            .await
            .into_data()
            .unwrap();

        let fetched = gw.fetch(&reference).await.into_data().unwrap();
        assert_eq!(fetched.as_ref(), b"%PDF body");
    }

    #[tokio::test]
    async fn reserved_characters_address_their_own_object() {
        let store = Arc::new(MemoryObjectStore::new());
        let gw = gateway(&store);
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 9, 0, 0).unwrap();
        let victim = gw.store_at(Bytes::from_static(b"victim"), "a.pdf", at).await;
        assert!(victim.is_success());

        let reference = gw
            .store_at(Bytes::from_static(b"mine"), "a.pdf#x", at)
            .await
            .into_data()
            .unwrap();
        let fetched = gw.fetch(&reference).await.into_data().unwrap();
        assert_eq!(fetched.as_ref(), b"mine");

        assert!(gw.delete(&reference).await.is_success());
        assert!(store.object("docs", "documents/2025/03/04/a.pdf#x").is_none());
        let object = store.object("docs", "documents/2025/03/04/a.pdf").unwrap();
        assert_eq!(object.data.as_ref(), b"victim");

        let encoded = gw
            .store_at(Bytes::from_static(b"percent"), "b%41.pdf", at)
            .await
            .into_data()
            .unwrap();
        let fetched = gw.fetch(&encoded).await.into_data().unwrap();
        assert_eq!(fetched.as_ref(), b"percent");
    }
}
