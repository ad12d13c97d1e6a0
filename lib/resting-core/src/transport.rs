//! The seam between the request pipeline and the network.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::{ProgressFuture, Result, WireRequest, WireResponse};

/// Executes resolved requests.
///
/// Implementations must settle every call exactly once and report failures
/// (connection, TLS, timeout) as errors rather than panicking.
pub trait Transport: Send + Sync + 'static {
    /// Send a request whose body is in memory (or absent).
    fn send(&self, request: WireRequest) -> BoxFuture<'static, Result<WireResponse>>;

    /// Send a request whose body is streamed from a staged file, reporting
    /// bytes written.
    ///
    /// The default implementation forwards to [`send`](Self::send) and
    /// reports nothing.
    fn upload(&self, request: WireRequest) -> ProgressFuture<WireResponse> {
        ProgressFuture::new(self.send(request))
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: WireRequest) -> BoxFuture<'static, Result<WireResponse>> {
        (**self).send(request)
    }

    fn upload(&self, request: WireRequest) -> ProgressFuture<WireResponse> {
        (**self).upload(request)
    }
}
