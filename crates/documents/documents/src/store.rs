use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vellum_core::{Document, Identifier, Visibility};

use crate::error::DocumentStoreError;

/// Storage backend for document metadata rows.
///
/// Backends never stamp audit fields themselves: the
/// [`DocumentRepository`](crate::DocumentRepository) does that before calling
/// in. Every read takes a [`Visibility`] and must hide soft-deleted rows
/// under [`Visibility::Active`].
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new row. The write is durable once this returns `Ok`.
    ///
    /// Fails with [`DocumentStoreError::Duplicate`] if the id is taken.
    async fn insert(&self, document: &Document) -> Result<(), DocumentStoreError>;

    /// Overwrite the mutable fields and `last_modification_time` of a
    /// visible row. Returns `false` if there is no visible row with that id.
    async fn update(&self, document: &Document) -> Result<bool, DocumentStoreError>;

    /// Fetch one row.
    async fn find(
        &self,
        id: Identifier,
        visibility: Visibility,
    ) -> Result<Option<Document>, DocumentStoreError>;

    /// Fetch all rows, ordered by identifier.
    async fn list(&self, visibility: Visibility) -> Result<Vec<Document>, DocumentStoreError>;

    /// Mark a row deleted at `at` unless it already is.
    ///
    /// Returns the row as stored afterwards (keeping the first deletion time
    /// on repeated calls), or `None` if no row has that id.
    async fn soft_delete(
        &self,
        id: Identifier,
        at: DateTime<Utc>,
    ) -> Result<Option<Document>, DocumentStoreError>;
}
