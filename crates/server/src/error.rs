use axum::{
    Json,
    response::{IntoResponse, Response},
};
use geofence::GeofenceError;
use http::StatusCode;
use serde::Serialize;

/// Fatal serve-loop errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind to address: {0}")]
    Bind(#[source] std::io::Error),

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),
}

/// A handler outcome the client should see. The HTTP status mapping for the
/// admission core's error taxonomy lives here, at the boundary; the core
/// itself never retries or maps anything.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub(crate) fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    /// A rejected location blames the caller; a zone-store outage is a
    /// server-side failure and must not masquerade as either verdict.
    pub(crate) fn from_geofence(error: GeofenceError) -> Self {
        match error {
            GeofenceError::Rejected(violation) => Self::forbidden(violation.to_string()),
            GeofenceError::Unavailable(error) => {
                log::error!("zone snapshot fetch failed: {error}");
                Self::service_unavailable("geofencing is temporarily unavailable")
            }
        }
    }
}

impl From<credentials::IssueError> for ApiError {
    fn from(error: credentials::IssueError) -> Self {
        log::error!("token issuance failed: {error}");
        Self::internal("failed to issue token")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct Content {
            error: String,
        }

        (self.status, Json(Content { error: self.message })).into_response()
    }
}
