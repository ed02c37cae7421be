use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};
use vellum_blob::{StorageGateway, object_key};
use vellum_core::{ApiError, ApiResponse, DOCUMENT_TYPE_PDF, Document, ErrorKind, Identifier};
use vellum_documents::DocumentRepository;
use vellum_render::Renderer;

use crate::deadline::within;
use crate::request::RenderRequest;

/// Sequences render, store and persist for each request.
///
/// Stages run strictly one after another. Nothing is rolled back: a
/// persistence failure after a successful upload leaves the object in
/// storage and reports its reference as orphaned.
#[derive(Clone)]
pub struct RenderPipeline {
    renderer: Arc<dyn Renderer>,
    storage: StorageGateway,
    documents: DocumentRepository,
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl RenderPipeline {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        storage: StorageGateway,
        documents: DocumentRepository,
    ) -> Self {
        Self {
            renderer,
            storage,
            documents,
        }
    }

    pub fn storage(&self) -> &StorageGateway {
        &self.storage
    }

    pub fn documents(&self) -> &DocumentRepository {
        &self.documents
    }

    /// Render `request`, store the PDF and record its metadata.
    ///
    /// Returns the storage reference with status 201.
    #[instrument(skip_all, fields(document_id = tracing::field::Empty))]
    pub async fn generate(
        &self,
        request: RenderRequest,
        deadline: Option<Instant>,
    ) -> ApiResponse<String> {
        let violations = request.validate();
        if !violations.is_empty() {
            return ApiResponse::bad_request("Invalid render request", violations)
                .with_kind(ErrorKind::ValidationFailed);
        }

        let id = Identifier::generate();
        tracing::Span::current().record("document_id", tracing::field::display(id));

        let pdf = match within(deadline, self.renderer.render(&request.html, &request.css)).await {
            Ok(Ok(pdf)) => pdf,
            Ok(Err(e)) => {
                error!(error = %e, "rendering failed");
                return ApiResponse::failure("Error rendering document", 502)
                    .with_kind(ErrorKind::RenderingFailed);
            }
            Err(_) => return deadline_exceeded("render", None),
        };

        let file_name = request
            .file_name
            .clone()
            .unwrap_or_else(|| format!("{id}.pdf"));

        let stored_at = Utc::now();
        let store = self.storage.store_at(pdf, &file_name, stored_at);
        let reference = match within(deadline, store).await {
            Ok(stored) => match stored.into_result() {
                Ok(reference) => reference,
                Err((error, status)) => return ApiResponse::from_error(error, status),
            },
            Err(_) => {
                // The upload may have landed before the deadline cut it off.
                let key = object_key(&file_name, stored_at);
                let reference = self.storage.format().reference_for(&key);
                return deadline_exceeded("store", Some(reference));
            }
        };

        let document = Document::new(
            id,
            request.title,
            request.description,
            reference.clone(),
            DOCUMENT_TYPE_PDF,
        );
        match within(deadline, self.documents.create(document)).await {
            Ok(created) => match created.into_result() {
                Ok(_) => {
                    info!(reference = %reference, "document generated");
                    ApiResponse::created(reference)
                }
                Err((error, status)) => {
                    error!(
                        orphaned_reference = %reference,
                        "metadata not persisted, stored object left orphaned"
                    );
                    ApiResponse::from_error(error.with_orphaned_reference(reference), status)
                }
            },
            Err(_) => deadline_exceeded("persist", Some(reference)),
        }
    }

    /// Soft-delete a document, then delete its stored object.
    ///
    /// Documents that are already soft-deleted are reported as not found.
    /// If the object cannot be deleted the row stays soft-deleted and the
    /// storage failure is returned.
    #[instrument(skip(self), fields(document_id = %id))]
    pub async fn remove(&self, id: Identifier, deadline: Option<Instant>) -> ApiResponse<()> {
        match within(deadline, self.documents.get(id)).await {
            Ok(found) => {
                if let Err((error, status)) = found.into_result() {
                    return ApiResponse::from_error(error, status);
                }
            }
            Err(_) => return deadline_exceeded("lookup", None),
        }

        let document = match within(deadline, self.documents.soft_delete(id)).await {
            Ok(deleted) => match deleted.into_result() {
                Ok(document) => document,
                Err((error, status)) => return ApiResponse::from_error(error, status),
            },
            Err(_) => return deadline_exceeded("soft delete", None),
        };

        match within(deadline, self.storage.delete(&document.url)).await {
            Ok(deleted) => match deleted.into_result() {
                Ok(()) => {
                    info!("document removed");
                    ApiResponse::no_content()
                }
                Err((error, status)) => {
                    warn!(
                        reference = %document.url,
                        status,
                        "row soft-deleted but stored object was not deleted"
                    );
                    ApiResponse::from_error(error, status)
                }
            },
            Err(_) => deadline_exceeded("storage delete", Some(document.url)),
        }
    }
}

fn deadline_exceeded<T>(stage: &str, orphaned_reference: Option<String>) -> ApiResponse<T> {
    let mut error =
        ApiError::new("Request deadline exceeded").with_kind(ErrorKind::DeadlineExceeded);
    match orphaned_reference {
        Some(reference) => {
            error!(
                stage,
                orphaned_reference = %reference,
                "deadline exceeded, stored object may be orphaned"
            );
            error = error.with_orphaned_reference(reference);
        }
        None => warn!(stage, "deadline exceeded"),
    }
    ApiResponse::from_error(error, 504)
}
