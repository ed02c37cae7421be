use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};
use vellum_core::{
    ApiResponse, Document, ErrorKind, Identifier, SaveKind, Visibility, pre_save,
};

use crate::store::DocumentStore;

/// Editable metadata of a stored document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetadataUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MetadataUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// Audited, soft-delete aware access to document metadata.
///
/// Stamps audit fields through [`pre_save`] before every write and turns
/// store errors into envelopes. Error detail is logged, never returned.
#[derive(Clone)]
pub struct DocumentRepository {
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for DocumentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentRepository").finish_non_exhaustive()
    }
}

impl DocumentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Persist a new document and return its identifier.
    ///
    /// The row is committed when this returns success.
    #[instrument(skip_all, fields(document_id = %document.id()))]
    pub async fn create(&self, mut document: Document) -> ApiResponse<Identifier> {
        pre_save(&mut document, SaveKind::Insert, Utc::now());
        match self.store.insert(&document).await {
            Ok(()) => {
                info!(document_type = %document.document_type, "document created");
                ApiResponse::success(document.id())
            }
            Err(e) => {
                error!(error = %e, "document insert failed");
                ApiResponse::internal_error(format!(
                    "Error creating document type {} - {}",
                    document.document_type, document.title
                ))
                .with_kind(ErrorKind::PersistenceFailure)
            }
        }
    }

    /// A visible document.
    pub async fn get(&self, id: Identifier) -> ApiResponse<Document> {
        self.find(id, Visibility::Active).await
    }

    /// A document regardless of deletion state.
    pub async fn get_including_deleted(&self, id: Identifier) -> ApiResponse<Document> {
        self.find(id, Visibility::IncludeDeleted).await
    }

    /// Visible documents in insertion order.
    pub async fn list(&self) -> ApiResponse<Vec<Document>> {
        self.list_with(Visibility::Active).await
    }

    /// All documents, deleted ones included, in insertion order.
    pub async fn list_including_deleted(&self) -> ApiResponse<Vec<Document>> {
        self.list_with(Visibility::IncludeDeleted).await
    }

    /// Change the title and/or description of a visible document.
    #[instrument(skip(self, update), fields(document_id = %id))]
    pub async fn update_metadata(
        &self,
        id: Identifier,
        update: MetadataUpdate,
    ) -> ApiResponse<Document> {
        if update.is_empty() {
            return ApiResponse::bad_request(
                "Nothing to update",
                vec!["at least one of title or description is required".to_owned()],
            )
            .with_kind(ErrorKind::ValidationFailed);
        }

        let mut document = match self.find(id, Visibility::Active).await.into_result() {
            Ok(document) => document,
            Err((error, status)) => return ApiResponse::from_error(error, status),
        };
        if let Some(title) = update.title {
            document.title = title;
        }
        if let Some(description) = update.description {
            document.description = description;
        }
        pre_save(&mut document, SaveKind::Update, Utc::now());

        match self.store.update(&document).await {
            Ok(true) => {
                info!("document metadata updated");
                ApiResponse::success(document)
            }
            // Deleted between the read and the write.
            Ok(false) => not_found(id),
            Err(e) => {
                error!(error = %e, "document update failed");
                persistence_failure(format!("Error updating document {id}"))
            }
        }
    }

    /// Soft-delete a document. Deleting an already deleted document
    /// succeeds and keeps the original deletion time.
    #[instrument(skip(self), fields(document_id = %id))]
    pub async fn soft_delete(&self, id: Identifier) -> ApiResponse<Document> {
        match self.store.soft_delete(id, Utc::now()).await {
            Ok(Some(document)) => {
                info!("document soft-deleted");
                ApiResponse::success(document)
            }
            Ok(None) => not_found(id),
            Err(e) => {
                error!(error = %e, "document soft delete failed");
                persistence_failure(format!("Error deleting document {id}"))
            }
        }
    }

    async fn find(&self, id: Identifier, visibility: Visibility) -> ApiResponse<Document> {
        match self.store.find(id, visibility).await {
            Ok(Some(document)) => ApiResponse::success(document),
            Ok(None) => {
                debug!(document_id = %id, ?visibility, "document not found");
                not_found(id)
            }
            Err(e) => {
                error!(document_id = %id, error = %e, "document read failed");
                persistence_failure(format!("Error reading document {id}"))
            }
        }
    }

    async fn list_with(&self, visibility: Visibility) -> ApiResponse<Vec<Document>> {
        match self.store.list(visibility).await {
            Ok(documents) => ApiResponse::success(documents),
            Err(e) => {
                error!(?visibility, error = %e, "document list failed");
                persistence_failure("Error listing documents")
            }
        }
    }
}

fn not_found<T>(id: Identifier) -> ApiResponse<T> {
    ApiResponse::not_found(format!("Document {id} not found")).with_kind(ErrorKind::DocumentNotFound)
}

fn persistence_failure<T>(message: impl Into<String>) -> ApiResponse<T> {
    ApiResponse::internal_error(message).with_kind(ErrorKind::PersistenceFailure)
}
