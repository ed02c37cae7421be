use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use vellum_core::{Audited, Document, Identifier, SoftDelete, Visibility};
use vellum_documents::{DocumentStore, DocumentStoreError};

/// Document store backed by a concurrent hash map.
///
/// Writes can be switched to fail, and inserts are counted, so flows built
/// on top can be checked for the calls they made.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    rows: DashMap<Identifier, Document>,
    fail_writes: AtomicBool,
    insert_calls: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make inserts, updates and soft deletes fail until switched back.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Number of `insert` calls received, failed ones included.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn check_writable(&self) -> Result<(), DocumentStoreError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(DocumentStoreError::Backend("writes disabled".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, document: &Document) -> Result<(), DocumentStoreError> {
        self.insert_calls.fetch_add(1, Ordering::Relaxed);
        self.check_writable()?;
        match self.rows.entry(document.id()) {
            Entry::Occupied(_) => Err(DocumentStoreError::Duplicate(document.id())),
            Entry::Vacant(slot) => {
                slot.insert(document.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, document: &Document) -> Result<bool, DocumentStoreError> {
        self.check_writable()?;
        let Some(mut row) = self.rows.get_mut(&document.id()) else {
            return Ok(false);
        };
        if row.is_deleted() {
            return Ok(false);
        }
        // Only mutable fields are taken; creation and deletion stay as stored.
        let mut updated = Document::from_parts(
            row.id(),
            document.title.clone(),
            document.description.clone(),
            document.url.clone(),
            document.document_type.clone(),
            row.audit().clone(),
        );
        if let Some(modified) = document.last_modification_time() {
            vellum_core::pre_save(&mut updated, vellum_core::SaveKind::Update, modified);
        }
        *row = updated;
        Ok(true)
    }

    async fn find(
        &self,
        id: Identifier,
        visibility: Visibility,
    ) -> Result<Option<Document>, DocumentStoreError> {
        Ok(self
            .rows
            .get(&id)
            .filter(|row| row.is_visible(visibility))
            .map(|row| row.clone()))
    }

    async fn list(&self, visibility: Visibility) -> Result<Vec<Document>, DocumentStoreError> {
        let mut documents: Vec<Document> = self
            .rows
            .iter()
            .filter(|row| row.is_visible(visibility))
            .map(|row| row.value().clone())
            .collect();
        documents.sort_by_key(Document::id);
        Ok(documents)
    }

    async fn soft_delete(
        &self,
        id: Identifier,
        at: DateTime<Utc>,
    ) -> Result<Option<Document>, DocumentStoreError> {
        self.check_writable()?;
        Ok(self.rows.get_mut(&id).map(|mut row| {
            row.audit_mut().mark_deleted(at);
            row.clone()
        }))
    }
}
