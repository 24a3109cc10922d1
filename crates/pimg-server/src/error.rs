use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pimg_catalog::CatalogError;
use pimg_store::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("malformed multipart request: {0}")]
    Multipart(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Store(e) => store_status(e),
            Self::Catalog(CatalogError::ProductNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Multipart(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show a client. Never contains filesystem paths.
    pub fn client_message(&self) -> String {
        match self {
            Self::Store(e) => store_message(e),
            Self::Catalog(CatalogError::ProductNotFound(id)) => format!("product {id} not found"),
            Self::Multipart(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => "internal server error".into(),
        }
    }
}

/// HTTP status for a storage failure.
pub fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::InvalidPath(_) | StoreError::Source(_) => StatusCode::BAD_REQUEST,
        StoreError::LimitExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Stable machine-readable name for a storage failure.
pub fn store_error_kind(err: &StoreError) -> &'static str {
    match err {
        StoreError::InvalidPath(_) => "invalid_path",
        StoreError::LimitExceeded { .. } => "limit_exceeded",
        StoreError::NotFound => "not_found",
        StoreError::Source(_) => "stream_interrupted",
        StoreError::Io(_) => "io_failure",
    }
}

/// Client-facing message for a storage failure.
pub fn store_message(err: &StoreError) -> String {
    match err {
        StoreError::InvalidPath(_) => "invalid image path".into(),
        StoreError::LimitExceeded { limit } => {
            format!("file exceeds maximum size of {limit} bytes")
        }
        StoreError::NotFound => "image not found".into(),
        StoreError::Source(_) => "upload stream interrupted".into(),
        StoreError::Io(_) => "internal storage error".into(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "client error");
        }
        (status, Json(json!({ "message": self.client_message() }))).into_response()
    }
}
