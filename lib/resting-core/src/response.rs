//! Decoded responses.

use std::collections::HashMap;

/// A successful response with a decoded body.
///
/// Returned by the client's `perform*`/`upload*` entry points; for "no
/// content" calls `T` is `()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T> {
    status: u16,
    headers: HashMap<String, String>,
    body: T,
}

impl<T> Response<T> {
    /// Creates a new response.
    #[must_use]
    pub const fn new(status: u16, headers: HashMap<String, String>, body: T) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Decoded body.
    #[must_use]
    pub const fn body(&self) -> &T {
        &self.body
    }

    /// Consume into the decoded body.
    #[must_use]
    pub fn into_body(self) -> T {
        self.body
    }

    /// Transform the body, keeping status and headers.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            headers: self.headers,
            body: f(self.body),
        }
    }
}
