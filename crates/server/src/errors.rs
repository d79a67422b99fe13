use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use service::auth::errors::AuthError;
use service::catalog::CatalogError;

/// Error response rendered as `{"ok": false, "error": "..."}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: &'static str,
    pub detail: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: Option<String>) -> Self {
        Self { status, title, detail }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(detail.into()))
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", None)
    }

    pub fn message(&self) -> &str {
        self.detail.as_deref().unwrap_or(self.title)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, title = self.title, detail = ?self.detail, "request failed");
        } else if self.status == StatusCode::CONFLICT {
            warn!(title = self.title, detail = ?self.detail, "request conflicted");
        }
        let body = serde_json::json!({ "ok": false, "error": self.message() });
        (self.status, Json(body)).into_response()
    }
}

impl From<CatalogError> for JsonApiError {
    fn from(e: CatalogError) -> Self {
        let (status, title) = match &e {
            CatalogError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation Error"),
            CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            CatalogError::Conflict(_) => (StatusCode::CONFLICT, "Position Conflict"),
            CatalogError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "Store Unavailable"),
        };
        Self::new(status, title, Some(e.to_string()))
    }
}

impl From<AuthError> for JsonApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => Self::bad_request(msg),
            AuthError::Unauthorized => Self::unauthorized(),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Auth Failure", Some(other.to_string())),
        }
    }
}

impl From<JsonRejection> for JsonApiError {
    fn from(e: JsonRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<QueryRejection> for JsonApiError {
    fn from(e: QueryRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_errors_map_to_status() {
        let cases = [
            (CatalogError::Validation("Missing service name".into()), StatusCode::BAD_REQUEST),
            (CatalogError::not_found("Ghost"), StatusCode::NOT_FOUND),
            (CatalogError::Conflict("dup".into()), StatusCode::CONFLICT),
            (CatalogError::Store("down".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }

    #[test]
    fn message_names_the_entry() {
        let e = JsonApiError::from(CatalogError::not_found("Ghost"));
        assert!(e.message().contains("Ghost"));
        assert_eq!(JsonApiError::unauthorized().message(), "Unauthorized");
    }
}
