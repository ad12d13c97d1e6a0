//! Error types for resting.

use std::collections::HashMap;

use bytes::Bytes;
use derive_more::{Display, Error, From};

/// Main error type for resting operations.
///
/// Transport failures (`Connection`, `Tls`, `Timeout`) mean no response was
/// received at all. `Http` means a response arrived with a status outside
/// `200..300`. A 2xx response whose body cannot be parsed is a `Decode` error.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Path template rendering or URL resolution failed.
    #[display("invalid path: {_0}")]
    #[from(skip)]
    InvalidPath(#[error(not(source))] String),

    /// A structured value could not be encoded into fields or a body.
    #[display("encoding failed at '{path}': {reason}")]
    #[from(skip)]
    EncodingFailed {
        /// Bracket path of the offending value (empty for the root).
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// A response was received with a non-2xx status.
    #[display("HTTP error {status}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response headers.
        #[error(not(source))]
        headers: HashMap<String, String>,
        /// Raw response body.
        #[error(not(source))]
        body: Bytes,
    },

    /// Response body could not be decoded into the declared type.
    #[display("decode error at '{path}': {message}")]
    #[from(skip)]
    Decode {
        /// JSON path to the failing field (e.g. `user.address.city`).
        path: String,
        /// Decoder message.
        message: String,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Wire request cannot be sent as built (bad header name, etc).
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// Staging a streamed body, or reading a referenced file, failed.
    #[display("staging error: {_0}")]
    #[from]
    Staging(std::io::Error),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidPath(err.to_string())
    }
}

impl Error {
    /// Create an HTTP error from a received response.
    #[must_use]
    pub fn http(status: u16, headers: HashMap<String, String>, body: Bytes) -> Self {
        Self::Http {
            status,
            headers,
            body,
        }
    }

    /// Create an invalid path error.
    #[must_use]
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath(message.into())
    }

    /// Create an encoding error at the given bracket path.
    #[must_use]
    pub fn encoding_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EncodingFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a decode error with path context.
    #[must_use]
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if no response was received at all.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Tls(_) | Self::Timeout)
    }

    /// Returns `true` if this is a decode error.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Response headers if this is an HTTP error.
    #[must_use]
    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        match self {
            Self::Http { headers, .. } => Some(headers),
            _ => None,
        }
    }

    /// Response body if this is an HTTP error.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Self::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Try to decode the HTTP error body as JSON.
    ///
    /// Returns `None` if this is not an HTTP error or its body is empty.
    ///
    /// ```ignore
    /// #[derive(Debug, Deserialize)]
    /// struct ApiError { code: String }
    ///
    /// if let Err(err) = client.perform(request).await {
    ///     if let Some(Ok(api)) = err.decode_body::<ApiError>() {
    ///         tracing::warn!(code = %api.code, "rejected");
    ///     }
    /// }
    /// ```
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body()
            .filter(|body| !body.is_empty())
            .map(|body| crate::from_json(body))
    }
}
