//! Basic authentication.

use std::sync::Arc;

use base64::Engine;

use super::bearer_auth::set_authorization;
use crate::{Interceptor, Next, ProgressFuture, WireRequest, WireResponse};

/// Adds `Authorization: Basic <base64(user:pass)>` to every request.
#[derive(Debug, Clone)]
pub struct BasicAuthInterceptor {
    /// Base64-encoded "username:password".
    encoded_credentials: Arc<str>,
}

impl BasicAuthInterceptor {
    /// Create a basic auth interceptor with the given username and password.
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        Self {
            encoded_credentials: Arc::from(encoded),
        }
    }
}

impl Interceptor for BasicAuthInterceptor {
    fn intercept(&self, request: WireRequest, next: Next) -> ProgressFuture<WireResponse> {
        next.run(set_authorization(
            request,
            format!("Basic {}", self.encoded_credentials),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_credentials() {
        let interceptor = BasicAuthInterceptor::new("aladdin", "opensesame");
        assert_eq!(&*interceptor.encoded_credentials, "YWxhZGRpbjpvcGVuc2VzYW1l");
    }
}
