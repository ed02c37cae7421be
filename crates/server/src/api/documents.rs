//! Document API endpoints.
//!
//! Rendering, listing, metadata edits and removal of stored documents. Every
//! handler answers with the envelope produced by the pipeline or repository,
//! using the envelope's status code as the HTTP status.

use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;
use vellum_core::{ApiResponse, Document, ErrorKind, Identifier};
use vellum_documents::MetadataUpdate;
use vellum_pipeline::RenderRequest;

use super::AppState;
use super::envelope::Envelope;

/// Header carrying the caller's time budget for the whole request.
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// Wire form of a [`Document`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub id: Identifier,
    pub title: String,
    pub description: String,
    pub url: String,
    pub document_type: String,
    pub creation_time: DateTime<Utc>,
    pub last_modification_time: Option<DateTime<Utc>>,
    pub deletion_time: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

impl From<Document> for DocumentView {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id(),
            creation_time: doc.creation_time(),
            last_modification_time: doc.last_modification_time(),
            deletion_time: doc.deletion_time(),
            is_deleted: doc.is_deleted(),
            title: doc.title,
            description: doc.description,
            url: doc.url,
            document_type: doc.document_type,
        }
    }
}

/// Query parameters for document reads.
#[derive(Debug, Default, Deserialize)]
pub struct ReadParams {
    /// Include soft-deleted documents.
    #[serde(default)]
    pub include_deleted: bool,
}

/// `POST /v1/documents`: render, store and record a document.
pub async fn create_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RenderRequest>, JsonRejection>,
) -> Envelope<String> {
    let deadline = match request_deadline(&headers) {
        Ok(deadline) => deadline,
        Err(response) => return response,
    };
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(&rejection),
    };
    state.pipeline.generate(request, deadline).await.into()
}

/// `GET /v1/documents`: list documents in identifier order.
pub async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<ReadParams>,
) -> Envelope<Vec<DocumentView>> {
    let repository = state.pipeline.documents();
    let listed = if params.include_deleted {
        repository.list_including_deleted().await
    } else {
        repository.list().await
    };
    listed
        .map(|docs| docs.into_iter().map(DocumentView::from).collect())
        .into()
}

/// `GET /v1/documents/{id}`
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ReadParams>,
) -> Envelope<DocumentView> {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let repository = state.pipeline.documents();
    let found = if params.include_deleted {
        repository.get_including_deleted(id).await
    } else {
        repository.get(id).await
    };
    found.map(DocumentView::from).into()
}

/// `PATCH /v1/documents/{id}`: edit title and description.
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<MetadataUpdate>, JsonRejection>,
) -> Envelope<DocumentView> {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Json(update) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_body(&rejection),
    };
    state
        .pipeline
        .documents()
        .update_metadata(id, update)
        .await
        .map(DocumentView::from)
        .into()
}

/// `DELETE /v1/documents/{id}`: soft-delete the row, then delete the object.
pub async fn delete_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Envelope<()> {
    let deadline = match request_deadline(&headers) {
        Ok(deadline) => deadline,
        Err(response) => return response,
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    state.pipeline.remove(id, deadline).await.into()
}

fn parse_id<T>(raw: &str) -> Result<Identifier, Envelope<T>> {
    Identifier::parse(raw).map_err(|e| {
        debug!(id = %raw, error = %e, "malformed document id");
        validation_failure("Invalid document id", e.to_string())
    })
}

fn request_deadline<T>(headers: &HeaderMap) -> Result<Option<Instant>, Envelope<T>> {
    let Some(value) = headers.get(REQUEST_TIMEOUT_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|ms| Some(Instant::now() + Duration::from_millis(ms)))
        .ok_or_else(|| {
            validation_failure(
                "Invalid request timeout",
                format!("{REQUEST_TIMEOUT_HEADER} must be a whole number of milliseconds"),
            )
        })
}

fn invalid_body<T>(rejection: &JsonRejection) -> Envelope<T> {
    validation_failure("Invalid request body", rejection.body_text())
}

fn validation_failure<T>(message: &str, detail: String) -> Envelope<T> {
    ApiResponse::bad_request(message, vec![detail])
        .with_kind(ErrorKind::ValidationFailed)
        .into()
}
