//! Middleware around the transport call.
//!
//! Interceptors run in registration order on the way in. Each receives the
//! current [`WireRequest`] and a [`Next`] handle to the rest of the chain; it
//! may rewrite the request, call `next` (at most once, enforced by `Next`
//! being consumed), transform the returned future, or answer on its own.
//!
//! ```
//! use resting_core::{Interceptor, Next, ProgressFuture, WireRequest, WireResponse};
//!
//! struct UserAgent;
//!
//! impl Interceptor for UserAgent {
//!     fn intercept(&self, request: WireRequest, next: Next) -> ProgressFuture<WireResponse> {
//!         next.run(request.with_header("User-Agent", "resting"))
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::{ProgressFuture, WireRequest, WireResponse};

/// A middleware stage.
pub trait Interceptor: Send + Sync {
    /// Handle `request`, usually by delegating to `next`.
    fn intercept(&self, request: WireRequest, next: Next) -> ProgressFuture<WireResponse>;
}

impl<F> Interceptor for F
where
    F: Fn(WireRequest, Next) -> ProgressFuture<WireResponse> + Send + Sync,
{
    fn intercept(&self, request: WireRequest, next: Next) -> ProgressFuture<WireResponse> {
        self(request, next)
    }
}

type NextFn = Box<dyn FnOnce(WireRequest) -> ProgressFuture<WireResponse> + Send>;

/// The remainder of the chain, ending with the transport call.
pub struct Next {
    run: NextFn,
}

impl Next {
    /// Wrap a terminal stage.
    pub fn new<F>(run: F) -> Self
    where
        F: FnOnce(WireRequest) -> ProgressFuture<WireResponse> + Send + 'static,
    {
        Self { run: Box::new(run) }
    }

    /// Run the rest of the chain.
    pub fn run(self, request: WireRequest) -> ProgressFuture<WireResponse> {
        (self.run)(request)
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// An ordered, shareable list of interceptors.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor; it runs after those already registered.
    pub fn push(&mut self, interceptor: impl Interceptor + 'static) {
        self.interceptors.push(Arc::new(interceptor));
    }

    /// Append a shared interceptor.
    pub fn push_arc(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// `true` when no interceptor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run `request` through every interceptor, then `terminal`.
    ///
    /// Built right to left: the last interceptor's `next` is `terminal`,
    /// every earlier interceptor's `next` is the remainder of the chain.
    pub fn run(&self, request: WireRequest, terminal: Next) -> ProgressFuture<WireResponse> {
        let next = self
            .interceptors
            .iter()
            .rev()
            .fold(terminal, |next, interceptor| {
                let interceptor = Arc::clone(interceptor);
                Next::new(move |request| interceptor.intercept(request, next))
            });
        next.run(request)
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};

    use http::Method;
    use url::Url;

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn push(log: &Log, entry: String) {
        log.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
    }

    fn request() -> WireRequest {
        WireRequest::builder(Method::GET, Url::parse("http://localhost/x").expect("url")).build()
    }

    fn echo_terminal(log: &Log) -> Next {
        let log = Arc::clone(log);
        Next::new(move |request: WireRequest| {
            push(&log, format!("transport {}", request.header("x-trail").unwrap_or("")));
            ProgressFuture::ready(Ok(WireResponse::new(200, HashMap::new(), "done")))
        })
    }

    fn tracing_stage(log: &Log, name: &'static str) -> impl Interceptor + 'static {
        let log = Arc::clone(log);
        move |request: WireRequest, next: Next| {
            push(&log, format!("in {name}"));
            let trail = format!("{}{name}", request.header("x-trail").unwrap_or(""));
            let log = Arc::clone(&log);
            next.run(request.with_header("x-trail", trail))
                .peek(move |response| push(&log, format!("out {name} {}", response.status())))
        }
    }

    #[tokio::test]
    async fn runs_in_order_and_unwinds_in_reverse() {
        let log = Log::default();
        let mut chain = InterceptorChain::new();
        chain.push(tracing_stage(&log, "A"));
        chain.push(tracing_stage(&log, "B"));

        let response = chain
            .run(request(), echo_terminal(&log))
            .await
            .expect("response");

        assert_eq!(response.text(), "done");
        assert_eq!(
            *log.lock().unwrap_or_else(PoisonError::into_inner),
            vec!["in A", "in B", "transport AB", "out B 200", "out A 200"]
        );
    }

    #[tokio::test]
    async fn interceptor_can_short_circuit() {
        let log = Log::default();
        let mut chain = InterceptorChain::new();
        chain.push(|_request: WireRequest, _next: Next| {
            ProgressFuture::ready(Ok(WireResponse::new(304, HashMap::new(), "")))
        });
        chain.push(tracing_stage(&log, "never"));

        let response = chain
            .run(request(), echo_terminal(&log))
            .await
            .expect("response");

        assert_eq!(response.status(), 304);
        assert!(log.lock().unwrap_or_else(PoisonError::into_inner).is_empty());
    }

    #[tokio::test]
    async fn empty_chain_calls_terminal() {
        let log = Log::default();
        let chain = InterceptorChain::new();
        assert!(chain.is_empty());

        chain
            .run(request(), echo_terminal(&log))
            .await
            .expect("response");
        assert_eq!(
            *log.lock().unwrap_or_else(PoisonError::into_inner),
            vec!["transport "]
        );
    }
}
