//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types for easy glob
//! importing:
//!
//! ```
//! use resting::prelude::*;
//! ```

pub use crate::{
    Date, Encoding, Endpoint, Error, FileRef, Interceptor, Next, Nothing, ProgressEvent,
    ProgressFuture, Request, Response, RestingClient, Result, WireRequest, WireResponse,
};
pub use serde::{Deserialize, Serialize};
