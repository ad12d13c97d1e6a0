//! Transport-level requests and responses.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use http::Method;
use url::Url;

/// Body of a [`WireRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WireBody {
    /// No body.
    #[default]
    Empty,
    /// In-memory body.
    Bytes(Bytes),
    /// Body streamed from a staged file.
    File(PathBuf),
}

/// A fully resolved request, ready for a transport.
///
/// A request carries either an in-memory body or a file reference, never
/// both.
#[derive(Debug, Clone)]
pub struct WireRequest {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: WireBody,
}

impl WireRequest {
    /// Creates a new [`WireRequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> WireRequestBuilder {
        WireRequestBuilder {
            method,
            url,
            headers: HashMap::new(),
            body: WireBody::Empty,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Mutable access to headers.
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// Single header value, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the request with one more header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> &WireBody {
        &self.body
    }

    /// Staged file, for streamed requests.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        match &self.body {
            WireBody::File(path) => Some(path),
            _ => None,
        }
    }

    /// `true` when the body is streamed from a file.
    #[must_use]
    pub const fn is_streamed(&self) -> bool {
        matches!(self.body, WireBody::File(_))
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HashMap<String, String>, WireBody) {
        (self.method, self.url, self.headers, self.body)
    }
}

/// Builder for constructing [`WireRequest`] instances.
#[derive(Debug, Clone)]
pub struct WireRequestBuilder {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: WireBody,
}

impl WireRequestBuilder {
    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets an in-memory body.
    ///
    /// # Panics
    ///
    /// If a streamed file body was already set.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        assert!(
            !matches!(self.body, WireBody::File(_)),
            "a streamed request cannot also carry an in-memory body"
        );
        self.body = WireBody::Bytes(body.into());
        self
    }

    /// Streams the body from `path`.
    ///
    /// # Panics
    ///
    /// If an in-memory body was already set.
    #[must_use]
    pub fn streamed(mut self, path: impl Into<PathBuf>) -> Self {
        assert!(
            !matches!(self.body, WireBody::Bytes(_)),
            "a streamed request cannot also carry an in-memory body"
        );
        self.body = WireBody::File(path.into());
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> WireRequest {
        WireRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// A received response: status, headers and the raw body.
#[derive(Debug, Clone)]
pub struct WireResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl WireResponse {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
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

    /// Raw body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body as UTF-8 text, lossily.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, HashMap<String, String>, Bytes) {
        (self.status, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://localhost/upload").expect("url")
    }

    #[test]
    fn builder_sets_parts() {
        let request = WireRequest::builder(Method::POST, url())
            .header("Content-Type", "application/json")
            .body("{}")
            .build();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body(), &WireBody::Bytes(Bytes::from_static(b"{}")));
        assert!(!request.is_streamed());
        assert!(request.file().is_none());
    }

    #[test]
    fn streamed_request_references_file() {
        let request = WireRequest::builder(Method::POST, url())
            .streamed("/tmp/staged")
            .build();
        assert!(request.is_streamed());
        assert_eq!(request.file(), Some(Path::new("/tmp/staged")));
    }

    #[test]
    #[should_panic(expected = "cannot also carry an in-memory body")]
    fn streamed_after_body_panics() {
        let _ = WireRequest::builder(Method::POST, url())
            .body("x")
            .streamed("/tmp/staged");
    }

    #[test]
    #[should_panic(expected = "cannot also carry an in-memory body")]
    fn body_after_streamed_panics() {
        let _ = WireRequest::builder(Method::POST, url())
            .streamed("/tmp/staged")
            .body("x");
    }

    #[test]
    fn response_status_classes() {
        assert!(WireResponse::new(204, HashMap::new(), Bytes::new()).is_success());
        assert!(!WireResponse::new(302, HashMap::new(), Bytes::new()).is_success());
        assert!(!WireResponse::new(199, HashMap::new(), Bytes::new()).is_success());

        let response = WireResponse::new(
            200,
            HashMap::from([("X-Id".to_string(), "7".to_string())]),
            "ok",
        );
        assert_eq!(response.header("x-id"), Some("7"));
        assert_eq!(response.text(), "ok");
    }
}
