//! Typed REST client for Rust.
//!
//! Declare endpoints as constants, build typed requests, and get decoded
//! responses or typed errors. Bodies are sent as JSON, flattened into
//! bracket-path query parameters, or flattened into multipart forms that can
//! be streamed from disk with upload progress.
//!
//! # Example
//!
//! ```no_run
//! use resting::prelude::*;
//!
//! #[derive(Debug, Serialize)]
//! struct NewPost {
//!     title: String,
//!     body: String,
//!     user_id: u64,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct Post {
//!     id: u64,
//!     title: String,
//! }
//!
//! const CREATE_POST: Endpoint<NewPost, Post> = Endpoint::post("/posts");
//!
//! # async fn run() -> resting::Result<()> {
//! let client = RestingClient::builder("https://jsonplaceholder.typicode.com/").build()?;
//! let request = Request::new(
//!     CREATE_POST,
//!     NewPost {
//!         title: "hello".to_string(),
//!         body: "world".to_string(),
//!         user_id: 1,
//!     },
//! );
//! let post = client.perform(request).await?.into_body();
//! println!("created {}", post.id);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod connector;
pub mod interceptors;
pub mod prelude;
mod transport;

pub use client::{RestingClient, RestingClientBuilder};
pub use config::{TransportConfig, TransportConfigBuilder};
pub use transport::{HyperTransport, HyperTransportBuilder};

// Re-export core types
pub use resting_core::{
    BinaryStrategy, ContentType, Converted, Date, DateStrategy, Delivery, DynamicHeaderProvider,
    DynamicPathVariableProvider, Encoding, Endpoint, Error, FileRef, Form, HeaderProvider,
    Interceptor, InterceptorChain, KeyStrategy, Method, MultipartEncoder, Next, Nothing, Part,
    PartSource, PathVariableProvider, ProgressEvent, ProgressFuture, ProgressReporter,
    QueryEncoder, QueryPair, Request, RequestBuilder, RequestConverter, Response, Result,
    StatusCode, Transport, WireBody, WireRequest, WireRequestBuilder, WireResponse, encoding,
    from_json, header, render_path, to_json,
};

// Re-export crates used in public signatures
pub use url;
