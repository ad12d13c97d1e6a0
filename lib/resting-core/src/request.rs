//! Typed requests against an [`Endpoint`].
//!
//! # Example
//!
//! ```
//! use resting_core::{Endpoint, Nothing, Request};
//!
//! const GET_POST: Endpoint<Nothing, serde_json::Value> = Endpoint::get("/posts/{{id}}");
//!
//! let request = Request::builder(GET_POST, Nothing)
//!     .path_variable("id", 1)
//!     .header("Accept", "application/json")
//!     .build();
//! assert_eq!(request.path_variables()["id"], "1");
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::{Endpoint, Nothing};

/// A typed request: an endpoint, a body, and per-request headers and path
/// variables that override provider defaults.
pub struct Request<Req, Res> {
    endpoint: Endpoint<Req, Res>,
    body: Req,
    headers: HashMap<String, String>,
    path_variables: HashMap<String, String>,
}

impl<Req, Res> Request<Req, Res> {
    /// Request with no extra headers or path variables.
    #[must_use]
    pub fn new(endpoint: Endpoint<Req, Res>, body: Req) -> Self {
        Self::builder(endpoint, body).build()
    }

    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(endpoint: Endpoint<Req, Res>, body: Req) -> RequestBuilder<Req, Res> {
        RequestBuilder {
            endpoint,
            body,
            headers: HashMap::new(),
            path_variables: HashMap::new(),
        }
    }

    /// Target endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint<Req, Res> {
        &self.endpoint
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> &Req {
        &self.body
    }

    /// Per-request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Per-request path variables.
    #[must_use]
    pub fn path_variables(&self) -> &HashMap<String, String> {
        &self.path_variables
    }
}

impl<Res> Request<Nothing, Res> {
    /// Request without a body.
    #[must_use]
    pub fn empty(endpoint: Endpoint<Nothing, Res>) -> Self {
        Self::new(endpoint, Nothing)
    }
}

impl<Req: fmt::Debug, Res> fmt::Debug for Request<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("endpoint", &self.endpoint)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("path_variables", &self.path_variables)
            .finish()
    }
}

/// Builder for constructing [`Request`] instances.
pub struct RequestBuilder<Req, Res> {
    endpoint: Endpoint<Req, Res>,
    body: Req,
    headers: HashMap<String, String>,
    path_variables: HashMap<String, String>,
}

impl<Req, Res> RequestBuilder<Req, Res> {
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

    /// Sets a path variable; the value is rendered with `Display`.
    #[must_use]
    pub fn path_variable(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.path_variables.insert(name.into(), value.to_string());
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> Request<Req, Res> {
        Request {
            endpoint: self.endpoint,
            body: self.body,
            headers: self.headers,
            path_variables: self.path_variables,
        }
    }
}
