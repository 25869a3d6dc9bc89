//! JSON error responses for API routes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use homereel_common::Error;

/// An [`Error`] returned from a JSON route.
#[derive(Debug)]
pub struct AppError(pub Error);

pub type ApiResult<T> = std::result::Result<T, AppError>;

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Error::ChannelResolutionEmpty(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "channel_resolution_empty")
            }
            Error::PortInUse(_) => (StatusCode::INTERNAL_SERVER_ERROR, "port_in_use"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_failure"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "code": code,
        }));
        (status, body).into_response()
    }
}
