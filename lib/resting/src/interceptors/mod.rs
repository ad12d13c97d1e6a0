//! Built-in interceptors.
//!
//! Interceptors run in registration order on the way in; the first one
//! registered sees the request first and the response last.
//!
//! | Interceptor | Feature | Effect |
//! |-------------|---------|--------|
//! | [`LoggingInterceptor`] | always | `tracing` events per request |
//! | [`BearerAuthInterceptor`] | always | `Authorization: Bearer <token>` |
//! | [`BasicAuthInterceptor`] | `interceptor-basic-auth` | `Authorization: Basic <base64>` |
//!
//! # Example
//!
//! ```no_run
//! use resting::RestingClient;
//! use resting::interceptors::{BearerAuthInterceptor, LoggingInterceptor};
//!
//! let client = RestingClient::builder("https://api.example.com/")
//!     .interceptor(LoggingInterceptor::new())
//!     .interceptor(BearerAuthInterceptor::new("my-token"))
//!     .build()?;
//! # let _ = client;
//! # Ok::<(), resting::Error>(())
//! ```

#[cfg(feature = "interceptor-basic-auth")]
mod basic_auth;
mod bearer_auth;
mod logging;

#[cfg(feature = "interceptor-basic-auth")]
pub use basic_auth::BasicAuthInterceptor;
pub use bearer_auth::BearerAuthInterceptor;
pub use logging::{LogLevel, LoggingInterceptor};
