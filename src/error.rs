//! Service Error Types
//!
//! Startup failures carry one of the process-level kinds below. Request
//! failures wrap the dispatch error tree and are turned into a JSON response
//! by [`ApiError`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use derive_more::{Display, Error};
use embedit_dispatch::error::ErrorKind as DispatchErrorKind;
use serde::Serialize;

/// A service error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("could not open the cache database")]
    Cache,
    #[display("could not set up providers")]
    Providers,
    #[display("could not render the embed")]
    Render,
    #[display("could not serve http")]
    Serve,
    #[display("{_0}")]
    Dispatch(#[error(not(source))] DispatchErrorKind),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Dispatch(kind) => kind.is_retryable(),
            _ => false,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Dispatch(kind) => match kind {
                DispatchErrorKind::NotFound => StatusCode::NOT_FOUND,
                // Usually a deleted, private or malformed post rather than our fault.
                DispatchErrorKind::InvalidUrl(_) | DispatchErrorKind::Upstream => StatusCode::BAD_REQUEST,
                DispatchErrorKind::NoMatchingVariant(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DispatchErrorKind::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
                DispatchErrorKind::CacheCorruption => StatusCode::INTERNAL_SERVER_ERROR,
                DispatchErrorKind::Cache => StatusCode::SERVICE_UNAVAILABLE,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Dispatch(kind) => match kind {
                DispatchErrorKind::NotFound => "not_found",
                DispatchErrorKind::InvalidUrl(_) => "invalid_url",
                DispatchErrorKind::Upstream => "upstream_error",
                DispatchErrorKind::NoMatchingVariant(_) => "no_matching_variant",
                DispatchErrorKind::Unsupported(_) => "unsupported",
                DispatchErrorKind::CacheCorruption => "cache_corruption",
                DispatchErrorKind::Cache => "cache_unavailable",
            },
            Self::Render => "render_error",
            _ => "internal_error",
        }
    }
}

/// Error returned from request handlers.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<embedit_dispatch::error::Error> for ApiError {
    fn from(err: embedit_dispatch::error::Error) -> Self {
        let kind = ErrorKind::Dispatch((*err).clone());
        Self(err.raise(kind))
    }
}

impl From<embedit_render::error::Error> for ApiError {
    fn from(err: embedit_render::error::Error) -> Self {
        Self(err.raise(ErrorKind::Render))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = &*self.0;
        let status = kind.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %kind, "request failed");
        }
        let body = ErrorBody { error: kind.code(), message: kind.to_string() };
        (status, Json(body)).into_response()
    }
}
