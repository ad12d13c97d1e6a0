//! Typed request to wire request conversion.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use http::header::CONTENT_TYPE;
use serde::Serialize;
use tempfile::TempPath;
use url::Url;

use crate::encoding::{MultipartEncoder, QueryEncoder};
use crate::provider::{merge, merge_headers};
use crate::template::render_path;
use crate::{ContentType, Encoding, Error, HeaderProvider, PathVariableProvider};
use crate::{Request, Result, WireRequest, to_json};

/// How the converted body is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delivery {
    /// Keep the body in memory.
    #[default]
    Buffered,
    /// Stage multipart bodies to a file and stream them.
    Streamed,
}

/// Result of a conversion: the wire request and, for a streamed multipart
/// body, the staged file it references.
///
/// The staged file is deleted when its [`TempPath`] is dropped.
#[derive(Debug)]
pub struct Converted {
    request: WireRequest,
    staged: Option<TempPath>,
}

impl Converted {
    /// The wire request.
    #[must_use]
    pub const fn request(&self) -> &WireRequest {
        &self.request
    }

    /// Split into the wire request and the staged file guard.
    #[must_use]
    pub fn into_parts(self) -> (WireRequest, Option<TempPath>) {
        (self.request, self.staged)
    }
}

/// Turns typed [`Request`]s into [`WireRequest`]s.
///
/// Conversion renders the path template with provider and request
/// variables, resolves it against the base URL, merges headers, then places
/// the body according to the endpoint's [`Encoding`].
#[derive(Clone, Default)]
pub struct RequestConverter {
    header_provider: Option<Arc<dyn HeaderProvider>>,
    path_variable_provider: Option<Arc<dyn PathVariableProvider>>,
    context_path: Option<String>,
    query: QueryEncoder,
    multipart: MultipartEncoder,
    staging_dir: Option<PathBuf>,
}

impl RequestConverter {
    /// Converter with no providers and default encoders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default header source.
    #[must_use]
    pub fn with_header_provider(mut self, provider: impl HeaderProvider + 'static) -> Self {
        self.header_provider = Some(Arc::new(provider));
        self
    }

    /// Set the default path variable source.
    #[must_use]
    pub fn with_path_variable_provider(
        mut self,
        provider: impl PathVariableProvider + 'static,
    ) -> Self {
        self.path_variable_provider = Some(Arc::new(provider));
        self
    }

    /// Prefix every endpoint path, e.g. `/api/v2`.
    #[must_use]
    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = Some(context_path.into());
        self
    }

    /// Replace the query encoder.
    #[must_use]
    pub fn with_query_encoder(mut self, encoder: QueryEncoder) -> Self {
        self.query = encoder;
        self
    }

    /// Replace the multipart encoder.
    #[must_use]
    pub fn with_multipart_encoder(mut self, encoder: MultipartEncoder) -> Self {
        self.multipart = encoder;
        self
    }

    /// Directory for staged multipart bodies. Defaults to the system temp
    /// directory.
    #[must_use]
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Directory used for staged bodies.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Convert `request` to a wire request targeting `base_url`.
    ///
    /// With [`Delivery::Streamed`], a multipart body is written to a new file
    /// in the staging directory, owned by the returned [`Converted`]. Other
    /// encodings ignore `delivery`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPath`] when the template cannot be rendered or the
    /// result is not a valid URL, [`Error::EncodingFailed`] when the body
    /// cannot be encoded, [`Error::Staging`] when the staged file cannot be
    /// written.
    pub fn convert<Req: Serialize, Res>(
        &self,
        request: &Request<Req, Res>,
        base_url: &Url,
        delivery: Delivery,
    ) -> Result<Converted> {
        let endpoint = request.endpoint();

        let defaults = self
            .path_variable_provider
            .as_ref()
            .map(|provider| provider.path_variables())
            .unwrap_or_default();
        let variables = merge(defaults, request.path_variables());
        let template = format!("{}{}", self.context_path.as_deref().unwrap_or(""), endpoint.path());
        let path = render_path(&template, &variables)?;
        let mut url = base_url
            .join(&path)
            .map_err(|err| Error::invalid_path(format!("cannot resolve '{path}': {err}")))?;

        let defaults = self
            .header_provider
            .as_ref()
            .map(|provider| provider.headers())
            .unwrap_or_default();
        let mut headers = merge_headers(defaults, request.headers());

        let mut staged = None;
        let builder = match endpoint.encoding() {
            Encoding::Query => {
                self.query.append_to(request.body(), &mut url)?;
                WireRequest::builder(endpoint.method().clone(), url)
            }
            Encoding::Json => {
                let body = to_json(request.body())?;
                set_content_type(&mut headers, ContentType::Json.as_str());
                WireRequest::builder(endpoint.method().clone(), url).body(body)
            }
            Encoding::Multipart => {
                let form = self.multipart.encode(request.body())?;
                set_content_type(&mut headers, &form.content_type());
                let builder = WireRequest::builder(endpoint.method().clone(), url);
                match delivery {
                    Delivery::Buffered => builder.body(form.encode()?),
                    Delivery::Streamed => {
                        let file = form.stage_in(&self.staging_dir())?;
                        let builder = builder.streamed(file.to_path_buf());
                        staged = Some(file);
                        builder
                    }
                }
            }
        };

        Ok(Converted {
            request: builder.headers(headers).build(),
            staged,
        })
    }
}

fn set_content_type(headers: &mut HashMap<String, String>, value: &str) {
    headers.retain(|name, _| !name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
    headers.insert("Content-Type".to_string(), value.to_string());
}

impl fmt::Debug for RequestConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConverter")
            .field("header_provider", &self.header_provider.is_some())
            .field("path_variable_provider", &self.path_variable_provider.is_some())
            .field("context_path", &self.context_path)
            .field("query", &self.query)
            .field("multipart", &self.multipart)
            .field("staging_dir", &self.staging_dir.as_deref().map(Path::display))
            .finish()
    }
}
