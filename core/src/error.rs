//! Error types for the Platega client.
//!
//! # Design
//! Two failure families are kept apart. `InvalidArgument` is raised locally
//! before any request is built. `Api` wraps an [`ApiError`] whose
//! [`ApiErrorKind`] says how the exchange with the server went wrong; every
//! API error carries the status code and raw body when one exists.
//! Cancellation is neither: it surfaces as `PlategaError::Cancelled`.

use thiserror::Error;

use crate::http::TransportError;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, PlategaError>;

/// Top-level error returned by every client operation.
#[derive(Debug, Error)]
pub enum PlategaError {
    /// The caller passed a missing or malformed value; nothing was sent.
    #[error("invalid argument `{name}`: {message}")]
    InvalidArgument {
        name: &'static str,
        message: String,
    },

    /// The request was attempted and failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The caller cancelled the operation while it was in flight.
    #[error("operation cancelled")]
    Cancelled,
}

impl PlategaError {
    pub(crate) fn invalid_argument(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            message: message.into(),
        }
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// How an API exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 401 or 403: credentials rejected.
    Authentication,
    /// 400: request payload rejected.
    Validation,
    /// 404.
    NotFound,
    /// Any other non-2xx status, or a transport failure (no status code).
    Http,
    /// 2xx response whose body is `null` or does not match the expected shape.
    Generic,
}

/// A failed exchange with the Platega API.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ApiErrorKind,
    status_code: Option<u16>,
    response_body: Option<String>,
    message: String,
    #[source]
    source: Option<TransportError>,
}

impl ApiError {
    /// Classify a non-2xx response. First match wins: 401/403, 400, 404, then
    /// everything else.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let (kind, message) = match status {
            401 | 403 => (
                ApiErrorKind::Authentication,
                "authentication failed; check X-MerchantId and X-Secret".to_string(),
            ),
            400 => (ApiErrorKind::Validation, "request validation failed".to_string()),
            404 => (ApiErrorKind::NotFound, "resource not found".to_string()),
            other => (
                ApiErrorKind::Http,
                format!("HTTP request failed with status code {other}"),
            ),
        };
        Self {
            kind,
            status_code: Some(status),
            response_body: Some(body.into()),
            message,
            source: None,
        }
    }

    /// The request never produced a response.
    pub fn transport(source: TransportError) -> Self {
        let message = match &source {
            TransportError::Timeout => "request to Platega API timed out".to_string(),
            _ => "failed to send HTTP request to Platega API".to_string(),
        };
        Self {
            kind: ApiErrorKind::Http,
            status_code: None,
            response_body: None,
            message,
            source: Some(source),
        }
    }

    /// A body that could not be turned into the expected type.
    pub fn unparsable(status: Option<u16>, body: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Generic,
            status_code: status,
            response_body: Some(body.into()),
            message: message.into(),
            source: None,
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn response_body(&self) -> Option<&str> {
        self.response_body.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the request never reached a response.
    pub fn is_transport(&self) -> bool {
        self.source.is_some()
    }
}
