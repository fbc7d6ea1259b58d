//! Mapping from service errors onto HTTP responses.
//!
//! Every non-2xx response carries `{"error": "<message>"}`. Domain messages
//! pass through verbatim; infrastructure failures are logged and replaced by a
//! generic message.

use crate::errors::{Error, ErrorKind};
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Body of every error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Benefit not found: 42")]
    error: String,
}

/// An error ready to be sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Builds an error response with an explicit status.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Maps an error raised by the transfer endpoint.
    ///
    /// Identical to the CRUD mapping except that a concurrency conflict is a
    /// 400, like every other rejected transfer.
    #[must_use]
    pub fn from_transfer_error(err: Error) -> Self {
        Self::classify(err, StatusCode::BAD_REQUEST)
    }

    /// Status code this error will be sent with
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    fn classify(err: Error, conflict_status: StatusCode) -> Self {
        let status = match err.kind() {
            ErrorKind::Validation | ErrorKind::State => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => conflict_status,
            ErrorKind::Infrastructure => {
                error!(error = %err, "Request failed");
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE);
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::classify(err, StatusCode::CONFLICT)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Convenience `Result` type for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;
