//! Request/response logging.
//!
//! Events are emitted with the `tracing` crate inside an `http_request` span
//! carrying the method and URL.

use std::time::Instant;

use tracing::{Level, debug, info, span, warn};

use crate::{Interceptor, Next, ProgressFuture, WireBody, WireRequest, WireResponse};

/// Verbosity of [`LoggingInterceptor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level, including headers and UTF-8 bodies.
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

/// Interceptor that logs requests and their outcome.
///
/// Register it first to time the whole chain, last to time only the
/// transport call.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor {
    level: LogLevel,
}

impl LoggingInterceptor {
    /// Create a logging interceptor with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging interceptor that logs details at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// Configured verbosity.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl Interceptor for LoggingInterceptor {
    fn intercept(&self, request: WireRequest, next: Next) -> ProgressFuture<WireResponse> {
        let method = request.method().clone();
        let url = request.url().to_string();
        let level = self.level;

        let span = span!(Level::INFO, "http_request", %method, %url);
        span.in_scope(|| match level {
            LogLevel::Debug => {
                debug!(
                    headers = ?request.headers(),
                    body = %describe_body(request.body()),
                    "sending request"
                );
            }
            LogLevel::Info => info!("sending request"),
        });

        let start = Instant::now();
        let on_success = span.clone();
        next.run(request)
            .peek(move |response| {
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                let status = response.status();
                on_success.in_scope(|| {
                    if response.is_success() {
                        info!(status, elapsed_ms, "request completed");
                    } else {
                        warn!(status, elapsed_ms, "request failed with HTTP error");
                    }
                    if level == LogLevel::Debug {
                        debug!(
                            headers = ?response.headers(),
                            body = %String::from_utf8_lossy(response.body()),
                            "response received"
                        );
                    }
                });
            })
            .inspect_err(move |err| {
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                span.in_scope(|| warn!(error = %err, elapsed_ms, "request failed"));
            })
    }
}

fn describe_body(body: &WireBody) -> String {
    match body {
        WireBody::Empty => String::new(),
        WireBody::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => format!("<{} bytes>", bytes.len()),
        },
        WireBody::File(path) => format!("<staged {}>", path.display()),
    }
}
