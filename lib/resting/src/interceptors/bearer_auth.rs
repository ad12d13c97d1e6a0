//! Bearer token authentication.

use std::sync::Arc;

use http::header::AUTHORIZATION;

use crate::{Interceptor, Next, ProgressFuture, WireRequest, WireResponse};

/// Adds `Authorization: Bearer <token>` to every request, replacing any
/// authorization header already present.
#[derive(Debug, Clone)]
pub struct BearerAuthInterceptor {
    token: Arc<str>,
}

impl BearerAuthInterceptor {
    /// Create a bearer auth interceptor with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::from(token.into()),
        }
    }
}

impl Interceptor for BearerAuthInterceptor {
    fn intercept(&self, request: WireRequest, next: Next) -> ProgressFuture<WireResponse> {
        next.run(set_authorization(request, format!("Bearer {}", self.token)))
    }
}

/// Replace the authorization header, whatever its case.
pub(super) fn set_authorization(mut request: WireRequest, value: String) -> WireRequest {
    request
        .headers_mut()
        .retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION.as_str()));
    request.with_header("Authorization", value)
}
