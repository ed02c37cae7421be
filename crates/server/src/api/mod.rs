pub mod documents;
pub mod envelope;
pub mod health;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vellum_pipeline::RenderPipeline;

/// Shared application state passed to all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Render, store and persist orchestration plus the repository behind it.
    pub pipeline: RenderPipeline,
}

impl AppState {
    pub fn new(pipeline: RenderPipeline) -> Self {
        Self { pipeline }
    }
}

/// Build the Axum router with all API routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/v1/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/v1/documents/{id}",
            get(documents::get_document)
                .patch(documents::update_document)
                .delete(documents::delete_document),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
