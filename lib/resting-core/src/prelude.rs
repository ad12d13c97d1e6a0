//! Prelude module for convenient imports.
//!
//! ```
//! use resting_core::prelude::*;
//! ```

pub use crate::{
    Date, Encoding, Endpoint, Error, FileRef, Interceptor, Next, Nothing, ProgressEvent,
    ProgressFuture, Request, Response, Result, WireRequest, WireResponse,
};
