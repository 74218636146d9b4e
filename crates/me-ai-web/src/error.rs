//! Request-level errors and their HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use me_ai::{CompletionError, KnowledgeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Body text for a request without a usable `message`.
pub const MISSING_MESSAGE: &str = "Missing message";

/// Body text for every server-side failure. Internal detail stays in the logs.
pub const GENERIC_ERROR: &str = "Something went wrong";

/// JSON error body: `{"error": "..."}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// Everything that can end an `/ask` request early.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing message")]
    MissingMessage,

    #[error("knowledge load failed: {0}")]
    Load(#[from] KnowledgeError),

    #[error("completion failed: {0}")]
    Upstream(#[from] CompletionError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingMessage => StatusCode::BAD_REQUEST,
            AppError::Load(_) | AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text the caller sees.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::MissingMessage => MISSING_MESSAGE,
            AppError::Load(_) | AppError::Upstream(_) => GENERIC_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::MissingMessage => {}
            AppError::Load(e) => error!(error = %e, "failed to load knowledge"),
            AppError::Upstream(e) => error!(error = %e, "completion request failed"),
        }
        let body = Json(ErrorBody {
            error: self.public_message().to_string(),
        });
        (self.status(), body).into_response()
    }
}
