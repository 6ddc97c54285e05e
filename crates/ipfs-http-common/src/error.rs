//! Error types for daemon API calls

use bytes::Bytes;
use serde::Deserialize;

use crate::endpoint::AddressError;
use crate::request::EncodeError;
use crate::version::VersionMismatch;

/// Client error type wrapping all possible error conditions
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ClientError {
    /// The daemon reported a version outside the accepted range
    #[error(transparent)]
    #[diagnostic(transparent)]
    VersionMismatch(#[from] VersionMismatch),

    /// Transport failure: connection refused, reset, invalid request, etc.
    #[error("connection error: {0}")]
    #[diagnostic(
        code(ipfs_http::connection),
        help("is the daemon running and listening on the configured API address?")
    )]
    Connection(#[diagnostic_source] TransportError),

    /// The call did not complete before its deadline
    #[error("request timed out")]
    #[diagnostic(code(ipfs_http::timeout))]
    Timeout,

    /// Response body could not be decoded
    #[error("protocol error: {0}")]
    #[diagnostic(code(ipfs_http::protocol))]
    Protocol(
        #[from]
        #[diagnostic_source]
        DecodeError,
    ),

    /// The daemon answered with a structured error payload
    #[error(transparent)]
    #[diagnostic(transparent)]
    ErrorResponse(#[from] ErrorResponse),

    /// Non-2xx response without a structured error payload
    #[error(transparent)]
    #[diagnostic(transparent)]
    Status(#[from] HttpError),

    /// Request could not be encoded
    #[error("{0}")]
    Encode(
        #[from]
        #[diagnostic_source]
        EncodeError,
    ),

    /// The configured address cannot be mapped to an HTTP endpoint
    #[error(transparent)]
    #[diagnostic(transparent)]
    Address(#[from] AddressError),
}

impl ClientError {
    /// Whether this error was caused by an expired deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// The daemon's error payload, if the daemon returned one.
    pub fn error_response(&self) -> Option<&ErrorResponse> {
        match self {
            Self::ErrorResponse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => Self::Timeout,
            other => Self::Connection(other),
        }
    }
}

/// Transport-level errors that occur during HTTP communication
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TransportError {
    /// Failed to establish connection to the daemon
    #[error("Connection error: {0}")]
    Connect(String),

    /// Request timed out inside the transport
    #[error("Request timeout")]
    Timeout,

    /// Request construction failed (malformed URI, headers, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other transport error
    #[error("Transport error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl From<std::convert::Infallible> for TransportError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

impl From<http::Error> for TransportError {
    fn from(e: http::Error) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}

#[cfg(feature = "reqwest-client")]
impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() || e.is_request() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Other(Box::new(e))
        }
    }
}

/// Response deserialization errors
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DecodeError {
    /// JSON deserialization failed
    #[error("Failed to deserialize JSON: {0}")]
    Json(
        #[from]
        #[source]
        serde_json::Error,
    ),
    /// A value was cut off at the end of the response body
    #[error("response ended in the middle of a JSON value")]
    Truncated,
    /// The call expects at least one item but the daemon sent none
    #[error("daemon returned an empty response")]
    Empty,
    /// A field the call depends on was absent
    #[error("response is missing the {0:?} field")]
    MissingField(&'static str),
    /// Base64 payload inside a response could not be decoded
    #[error("invalid base64 in response: {0}")]
    Base64(
        #[from]
        #[source]
        base64::DecodeError,
    ),
    /// Version string did not have a dotted numeric prefix
    #[error("invalid version string {0:?}")]
    #[diagnostic(help("expected something like \"0.5.1\" or \"0.5.1-dev\""))]
    InvalidVersion(String),
}

/// Structured error payload returned by the daemon on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
#[error("daemon error ({status}): {message}")]
#[diagnostic(code(ipfs_http::error_response))]
pub struct ErrorResponse {
    /// HTTP status the payload arrived with
    pub status: http::StatusCode,
    /// Human readable message
    pub message: String,
    /// Numeric error code
    pub code: i64,
    /// Error type tag, usually `"error"`
    pub kind: String,
}

/// Wire shape of [`ErrorResponse`].
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ErrorPayload {
    pub message: String,
    #[serde(default)]
    pub code: i64,
    #[serde(rename = "Type", default)]
    pub kind: String,
}

/// HTTP error response without a recognizable daemon payload
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[diagnostic(code(ipfs_http::status))]
pub struct HttpError {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response body if available
    pub body: Option<Bytes>,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(body) = &self.body {
            if let Ok(s) = std::str::from_utf8(body) {
                if !s.trim().is_empty() {
                    write!(f, ":\n{}", s)?;
                }
            }
        }
        Ok(())
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
