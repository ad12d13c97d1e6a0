//! Core types and traits for the resting REST client.
//!
//! This crate holds everything that does not touch the network:
//! - [`Endpoint`], [`Request`] and [`Response`] - typed request descriptions
//! - [`QueryEncoder`] and [`MultipartEncoder`] - bracket-path flatteners over `serde`
//! - [`RequestConverter`] - typed request to [`WireRequest`] conversion
//! - [`Interceptor`] and [`InterceptorChain`] - middleware around the transport call
//! - [`Transport`] - the seam implemented by the HTTP backend
//! - [`ProgressFuture`] - futures that report upload progress through combinators
//! - [`Error`] and [`Result`] - error handling
//! - [`StatusCode`], [`header`] and [`Method`] - re-exported from the `http` crate

mod body;
mod converter;
pub mod encoding;
mod endpoint;
mod error;
mod interceptor;
mod multipart;
pub mod prelude;
mod progress;
mod provider;
mod request;
mod response;
mod template;
mod transport;
mod wire;

pub use body::{ContentType, Nothing, from_json, to_json};
pub use converter::{Converted, Delivery, RequestConverter};
pub use encoding::{
    BinaryStrategy, Date, DateStrategy, FileRef, KeyStrategy, MultipartEncoder, QueryEncoder,
    QueryPair,
};
pub use endpoint::{Encoding, Endpoint};
pub use error::{Error, Result};
pub use interceptor::{Interceptor, InterceptorChain, Next};
pub use multipart::{Form, Part, PartSource};
pub use progress::{ProgressEvent, ProgressFuture, ProgressReporter};
pub use provider::{
    DynamicHeaderProvider, DynamicPathVariableProvider, HeaderProvider, PathVariableProvider,
};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use template::render_path;
pub use transport::Transport;
pub use wire::{WireBody, WireRequest, WireRequestBuilder, WireResponse};

pub use http::{Method, StatusCode, header};
