//! Error handling for the SHELF HTTP layer.
//!
//! Every error is translated at the boundary into a `{"detail": ...}` body:
//! a list of per-field objects for validation failures, a plain string for
//! everything else. The wire shape is part of the public API contract.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Application error types that map to HTTP responses.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation error")]
    Validation { detail: Vec<serde_json::Value> },

    #[error("not found: {detail}")]
    NotFound { detail: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Create a validation error from per-field detail objects.
    pub fn validation(detail: Vec<serde_json::Value>) -> Self {
        Self::Validation { detail }
    }

    /// Create a not found error with a fixed detail message.
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound {
            detail: detail.into(),
        }
    }

    /// Build a single validation detail entry in the standard
    /// `{loc, msg, type}` convention.
    pub fn field_detail(loc: &[&str], msg: &str, kind: &str) -> serde_json::Value {
        json!({ "loc": loc, "msg": msg, "type": kind })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();

        let (status, detail) = match self {
            ApiError::Validation { detail } => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!(detail))
            }
            ApiError::NotFound { detail } => (StatusCode::NOT_FOUND, json!(detail)),
            ApiError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, json!(e.to_string())),
        };

        tracing::error!(
            error_id = %error_id,
            status_code = %status.as_u16(),
            "request error"
        );

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn validation_error_carries_detail() {
        let detail = vec![ApiError::field_detail(
            &["body", "title"],
            "Field required",
            "missing",
        )];
        let error = ApiError::validation(detail.clone());

        match error {
            ApiError::Validation { detail: d } => assert_eq!(d, detail),
            _ => panic!("expected Validation error"),
        }
    }

    #[tokio::test]
    async fn not_found_maps_to_404_with_detail_string() {
        let response = ApiError::not_found("Book not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "detail": "Book not found" }));
    }

    #[tokio::test]
    async fn validation_maps_to_422_with_detail_list() {
        let detail = vec![ApiError::field_detail(
            &["body", "author"],
            "Field required",
            "missing",
        )];
        let response = ApiError::validation(detail).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert!(body["detail"].is_array());
        assert_eq!(body["detail"][0]["loc"], serde_json::json!(["body", "author"]));
        assert_eq!(body["detail"][0]["type"], "missing");
    }

    #[tokio::test]
    async fn internal_maps_to_500_with_message() {
        let error = ApiError::Internal(anyhow::anyhow!("replace step failed"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "detail": "replace step failed" }));
    }
}
