//! HTTP mapping of portal errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::portal::PortalError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// A [`PortalError`] rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub PortalError);

impl From<PortalError> for ApiError {
    fn from(error: PortalError) -> Self {
        Self(error)
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PortalError::NotFound { .. } => StatusCode::NOT_FOUND,
            PortalError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            PortalError::Authentication { .. }
            | PortalError::UpstreamParse { .. }
            | PortalError::Transport { .. }
            | PortalError::HttpStatus { .. } => StatusCode::BAD_GATEWAY,
            PortalError::InvalidUrl { .. } | PortalError::ClientBuild { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self.0, "portal query failed");
        }
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
