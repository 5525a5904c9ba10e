//! Failure taxonomy for the relay handler and its mapping onto HTTP responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::ErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// `message` or `apiKey` was absent, null or empty.
    #[error("Missing message or API key")]
    MissingFields,

    /// The upstream answered with anything other than 200.
    #[error("NVIDIA API error: {body}")]
    Upstream { status: StatusCode, body: String },

    /// Anything else: transport failures, undecodable bodies, bad header values.
    /// The text is returned to the caller verbatim.
    #[error("{0}")]
    Unexpected(String),
}

impl RelayError {
    pub fn unexpected(err: impl std::fmt::Display) -> Self {
        Self::Unexpected(err.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingFields => StatusCode::BAD_REQUEST,
            RelayError::Upstream { status, .. } if can_carry_body(*status) => *status,
            RelayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            RelayError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 1xx, 204, 205 and 304 responses cannot hold the `{error}` body, so those upstream
/// statuses are reported as 502 instead.
fn can_carry_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::RESET_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
