//! Endpoint descriptors.

use std::fmt;
use std::marker::PhantomData;

use http::Method;

/// How a request body is placed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Whole body as `application/json`.
    #[default]
    Json,
    /// Flattened into URL query parameters; no body.
    Query,
    /// Flattened into `multipart/form-data` fields.
    Multipart,
}

/// Static description of an HTTP operation.
///
/// `Req` is the body type sent and `Res` the type decoded from the response.
/// Endpoints are plain values, usually declared as constants:
///
/// ```
/// use resting_core::{Encoding, Endpoint, Method, Nothing};
///
/// #[derive(serde::Deserialize)]
/// struct Post { id: u64 }
///
/// const GET_POST: Endpoint<Nothing, Post> = Endpoint::get("/posts/{{id}}");
/// const CREATE_POST: Endpoint<Post, Post> = Endpoint::multipart("/posts");
/// const REPLACE_POST: Endpoint<Post, Post> =
///     Endpoint::new(Method::PUT, "/posts/{{id}}", Encoding::Multipart);
/// # let _ = (GET_POST, CREATE_POST, REPLACE_POST);
/// ```
pub struct Endpoint<Req, Res> {
    method: Method,
    path: &'static str,
    encoding: Encoding,
    _types: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res> Endpoint<Req, Res> {
    /// Create an endpoint.
    #[must_use]
    pub const fn new(method: Method, path: &'static str, encoding: Encoding) -> Self {
        Self {
            method,
            path,
            encoding,
            _types: PhantomData,
        }
    }

    /// `GET` with query encoding.
    #[must_use]
    pub const fn get(path: &'static str) -> Self {
        Self::new(Method::GET, path, Encoding::Query)
    }

    /// `DELETE` with query encoding.
    #[must_use]
    pub const fn delete(path: &'static str) -> Self {
        Self::new(Method::DELETE, path, Encoding::Query)
    }

    /// `POST` with JSON encoding.
    #[must_use]
    pub const fn post(path: &'static str) -> Self {
        Self::new(Method::POST, path, Encoding::Json)
    }

    /// `PUT` with JSON encoding.
    #[must_use]
    pub const fn put(path: &'static str) -> Self {
        Self::new(Method::PUT, path, Encoding::Json)
    }

    /// `PATCH` with JSON encoding.
    #[must_use]
    pub const fn patch(path: &'static str) -> Self {
        Self::new(Method::PATCH, path, Encoding::Json)
    }

    /// `POST` with multipart encoding.
    #[must_use]
    pub const fn multipart(path: &'static str) -> Self {
        Self::new(Method::POST, path, Encoding::Multipart)
    }

    /// Replace the body encoding.
    ///
    /// Not usable in `const` items; declare those through [`Endpoint::new`].
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Path template, e.g. `/posts/{{id}}`.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Body encoding.
    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl<Req, Res> Clone for Endpoint<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            path: self.path,
            encoding: self.encoding,
            _types: PhantomData,
        }
    }
}

impl<Req, Res> fmt::Debug for Endpoint<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl<Req, Res> fmt::Display for Endpoint<Req, Res> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}
