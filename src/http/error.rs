//! Maps service errors onto `{ ok: false, error }` JSON responses.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::admin::AdminError;
use crate::checkout::CheckoutError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self { Self::BadRequest(format!("Invalid request body: {}", e.body_text())) }
}

/// `Json` extractor whose rejection is reported as an [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Checkout(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Admin(e) => match e {
                AdminError::OrderNotFound(_) | AdminError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                AdminError::InvalidProduct(_) | AdminError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
                AdminError::TransitionRejected { .. } => StatusCode::CONFLICT,
                AdminError::PartialDelete { .. } | AdminError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing text. Storage details stay in the logs.
    fn message(&self) -> String {
        match self {
            Self::Checkout(CheckoutError::Storage(_)) => "Failed to create order".into(),
            Self::Admin(AdminError::Storage(_)) => "Internal server error".into(),
            Self::Admin(AdminError::OrderNotFound(_)) => "Order not found".into(),
            Self::Admin(AdminError::ProductNotFound(_)) => "Product not found".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "ok": false, "error": self.message() }))).into_response()
    }
}
