use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::error::BlobError;
use crate::store::ObjectStore;

/// An object held by [`MemoryObjectStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// In-memory [`ObjectStore`] for development and tests.
///
/// Counts calls per operation and can be told to reject uploads, so callers
/// can assert which round trips a flow made.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<(String, String), StoredObject>,
    reject_puts: Mutex<Option<u16>>,
    put_calls: AtomicUsize,
    exists_calls: AtomicUsize,
    get_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `put` fail with the given status, or succeed
    /// again with `None`.
    pub fn reject_puts_with(&self, status: Option<u16>) {
        *self
            .reject_puts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = status;
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .get(&(bucket.to_owned(), key.to_owned()))
            .map(|o| o.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::Relaxed)
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::Relaxed)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::Relaxed)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), BlobError> {
        self.put_calls.fetch_add(1, Ordering::Relaxed);
        let rejection = *self
            .reject_puts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(status) = rejection {
            return Err(BlobError::Rejected {
                status,
                message: "upload rejected".into(),
            });
        }
        self.objects.insert(
            (bucket.to_owned(), key.to_owned()),
            StoredObject {
                data,
                content_type: content_type.to_owned(),
            },
        );
        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, BlobError> {
        self.exists_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .objects
            .contains_key(&(bucket.to_owned(), key.to_owned())))
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Bytes>, BlobError> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.object(bucket, key).map(|o| o.data))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), BlobError> {
        self.delete_calls.fetch_add(1, Ordering::Relaxed);
        self.objects.remove(&(bucket.to_owned(), key.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryObjectStore::new();
        store
            .put("b", "k", Bytes::from_static(b"data"), "application/pdf")
            .await
            .unwrap();
        assert!(store.exists("b", "k").await.unwrap());
        assert!(!store.exists("other", "k").await.unwrap());
        assert_eq!(
            store.get("b", "k").await.unwrap().unwrap().as_ref(),
            b"data"
        );

        store.delete("b", "k").await.unwrap();
        assert!(store.get("b", "k").await.unwrap().is_none());
        assert!(store.is_empty());
        assert_eq!(store.put_calls(), 1);
        assert_eq!(store.exists_calls(), 2);
        assert_eq!(store.delete_calls(), 1);
    }

    #[tokio::test]
    async fn rejection_can_be_toggled() {
        let store = MemoryObjectStore::new();
        store.reject_puts_with(Some(500));
        let err = store
            .put("b", "k", Bytes::new(), "application/pdf")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(store.is_empty());

        store.reject_puts_with(None);
        store
            .put("b", "k", Bytes::new(), "application/pdf")
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }
}
