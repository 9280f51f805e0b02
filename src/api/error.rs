//! Client-facing error payloads and the terminal failure boundary.
//!
//! Handlers translate only the failures they understand (validation,
//! uniqueness, ownership, missing rows). Everything else ends up in
//! [`unhandled`], which is the single place a `500` is produced.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

use crate::api::ApiConfig;

/// Generic 401 body. All credential failure kinds answer with this exact
/// payload so the client cannot tell them apart.
pub(crate) fn access_denied() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Access Denied" })),
    )
        .into_response()
}

/// Ordered list of field validation messages.
pub(crate) fn validation(errors: Vec<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
}

/// Resource-specific single-message body (403/404 and the duplicate-email 400).
pub(crate) fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Terminal boundary for anything no handler knows how to translate.
///
/// The body never carries the failure chain; full detail goes to the log,
/// and only when error logging was enabled at startup.
pub(crate) fn unhandled(config: &ApiConfig, err: anyhow::Error) -> Response {
    if config.log_errors {
        error!("Unhandled failure: {err:?}");
    }

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": err.to_string(), "error": {} })),
    )
        .into_response()
}

/// Fallback for unmatched routes, shaped like any other uncaught failure.
pub async fn route_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Route Not Found", "error": {} })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn access_denied_is_generic() {
        let response = access_denied();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Access Denied" })
        );
    }

    #[tokio::test]
    async fn validation_preserves_order() {
        let response = validation(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "errors": ["first", "second"] })
        );
    }

    #[tokio::test]
    async fn unhandled_answers_generic_envelope() {
        let config = ApiConfig { log_errors: false };
        let response = unhandled(&config, anyhow!("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "boom", "error": {} })
        );
    }

    #[tokio::test]
    async fn fallback_reports_route_not_found() {
        let response = route_not_found().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "message": "Route Not Found", "error": {} })
        );
    }
}
