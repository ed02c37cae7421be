//! Conversion of result envelopes into HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use vellum_core::ApiResponse;

/// An [`ApiResponse`] rendered as an HTTP response with its own status code.
///
/// `204` responses have no body; everything else carries the envelope as
/// `{ "success", "status_code", "data", "error" }`.
#[derive(Debug)]
pub struct Envelope<T>(pub ApiResponse<T>);

impl<T> From<ApiResponse<T>> for Envelope<T> {
    fn from(response: ApiResponse<T>) -> Self {
        Self(response)
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status == StatusCode::NO_CONTENT {
            return status.into_response();
        }
        (status, Json(self.0)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use vellum_core::ErrorKind;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn status_code_follows_envelope() {
        let response = Envelope(ApiResponse::created("ref".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "ref");
    }

    #[tokio::test]
    async fn storage_status_passes_through() {
        let response = Envelope(
            ApiResponse::<String>::failure("Failed to upload to S3. Status code: 403", 403)
                .with_kind(ErrorKind::StorageFailure),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["error"]["kind"], "STORAGE_FAILURE");
    }

    #[tokio::test]
    async fn no_content_has_empty_body() {
        let response = Envelope(ApiResponse::no_content()).into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_status_becomes_500() {
        let response = Envelope(ApiResponse::<()>::failure("odd", 42)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
