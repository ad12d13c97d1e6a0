//! The request pipeline entry points.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::TempPath;
use tracing::{debug, warn};
use url::Url;

use crate::{
    Delivery, Error, HeaderProvider, HyperTransport, Interceptor, InterceptorChain,
    MultipartEncoder, Next, PathVariableProvider, ProgressFuture, QueryEncoder, Request,
    RequestConverter, Response, Result, Transport, TransportConfig, WireRequest, WireResponse,
    from_json,
};

/// Typed REST client.
///
/// Every call converts the request, runs it through the interceptors with the
/// transport as the innermost stage, removes any staged body file, checks the
/// status, then decodes the body.
///
/// * `perform*` keeps bodies in memory and reports no progress.
/// * `upload*` stages multipart bodies to a temporary file, streams it, and
///   reports bytes sent through [`ProgressFuture::on_progress`].
///
/// Each family has three response shapes: always decode, `_optional` (an
/// empty body is `None`), and `_empty` (the body is discarded).
///
/// ```no_run
/// use resting::{Endpoint, Nothing, Request, RestingClient};
///
/// #[derive(Debug, serde::Deserialize)]
/// struct Post {
///     id: u64,
///     title: String,
/// }
///
/// const GET_POST: Endpoint<Nothing, Post> = Endpoint::get("/posts/{{id}}");
///
/// # async fn run() -> resting::Result<()> {
/// let client = RestingClient::builder("https://jsonplaceholder.typicode.com/").build()?;
/// let request = Request::builder(GET_POST, Nothing).path_variable("id", 1).build();
/// let post = client.perform(request).await?.into_body();
/// println!("{post:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RestingClient {
    base_url: Url,
    converter: RequestConverter,
    interceptors: InterceptorChain,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for RestingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestingClient")
            .field("base_url", &self.base_url.as_str())
            .field("converter", &self.converter)
            .field("interceptors", &self.interceptors)
            .finish_non_exhaustive()
    }
}

impl RestingClient {
    /// Create a new client builder.
    pub fn builder(base_url: impl Into<String>) -> RestingClientBuilder {
        RestingClientBuilder {
            base_url: base_url.into(),
            converter: RequestConverter::default(),
            interceptors: InterceptorChain::new(),
            transport: None,
            config: TransportConfig::default(),
        }
    }

    /// Base URL every endpoint path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send `request` and decode the response body.
    pub fn perform<Req, Res>(&self, request: Request<Req, Res>) -> ProgressFuture<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned + Send + 'static,
    {
        self.execute(&request, Delivery::Buffered).try_map(decode)
    }

    /// Send `request`; an empty response body decodes to `None`.
    pub fn perform_optional<Req, Res>(
        &self,
        request: Request<Req, Res>,
    ) -> ProgressFuture<Response<Option<Res>>>
    where
        Req: Serialize,
        Res: DeserializeOwned + Send + 'static,
    {
        self.execute(&request, Delivery::Buffered)
            .try_map(decode_optional)
    }

    /// Send `request` and discard the response body.
    pub fn perform_empty<Req: Serialize, Res>(
        &self,
        request: Request<Req, Res>,
    ) -> ProgressFuture<Response<()>> {
        self.execute(&request, Delivery::Buffered).map(discard)
    }

    /// Upload `request`, streaming multipart bodies from a staged file, and
    /// decode the response body.
    pub fn upload<Req, Res>(&self, request: Request<Req, Res>) -> ProgressFuture<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned + Send + 'static,
    {
        self.execute(&request, Delivery::Streamed).try_map(decode)
    }

    /// Upload `request`; an empty response body decodes to `None`.
    pub fn upload_optional<Req, Res>(
        &self,
        request: Request<Req, Res>,
    ) -> ProgressFuture<Response<Option<Res>>>
    where
        Req: Serialize,
        Res: DeserializeOwned + Send + 'static,
    {
        self.execute(&request, Delivery::Streamed)
            .try_map(decode_optional)
    }

    /// Upload `request` and discard the response body.
    pub fn upload_empty<Req: Serialize, Res>(
        &self,
        request: Request<Req, Res>,
    ) -> ProgressFuture<Response<()>> {
        self.execute(&request, Delivery::Streamed).map(discard)
    }

    /// Convert, intercept, send, clean up, check status.
    fn execute<Req: Serialize, Res>(
        &self,
        request: &Request<Req, Res>,
        delivery: Delivery,
    ) -> ProgressFuture<WireResponse> {
        let (wire, staged) = match self.converter.convert(request, &self.base_url, delivery) {
            Ok(converted) => converted.into_parts(),
            Err(err) => {
                debug!(endpoint = %request.endpoint(), error = %err, "request conversion failed");
                return ProgressFuture::err(err);
            }
        };
        debug!(
            method = %wire.method(),
            url = %wire.url(),
            streamed = wire.is_streamed(),
            interceptors = self.interceptors.len(),
            "request converted"
        );

        let transport = Arc::clone(&self.transport);
        let terminal = Next::new(move |request: WireRequest| {
            if request.is_streamed() {
                transport.upload(request)
            } else {
                ProgressFuture::new(transport.send(request))
            }
        });

        self.interceptors
            .run(wire, terminal)
            .finally(move || remove_staged(staged))
            .try_map(check_status)
    }
}

fn check_status(response: WireResponse) -> Result<WireResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        let (status, headers, body) = response.into_parts();
        Err(Error::http(status, headers, body))
    }
}

fn decode<T: DeserializeOwned>(response: WireResponse) -> Result<Response<T>> {
    let (status, headers, body) = response.into_parts();
    let value = from_json(&body)?;
    Ok(Response::new(status, headers, value))
}

fn decode_optional<T: DeserializeOwned>(response: WireResponse) -> Result<Response<Option<T>>> {
    let (status, headers, body) = response.into_parts();
    let value = if body.is_empty() {
        None
    } else {
        Some(from_json(&body)?)
    };
    Ok(Response::new(status, headers, value))
}

fn discard(response: WireResponse) -> Response<()> {
    let (status, headers, _) = response.into_parts();
    Response::new(status, headers, ())
}

/// Deletes a staged body once the call settles. A call dropped before
/// settling deletes it through the guard's own `Drop`.
fn remove_staged(staged: Option<TempPath>) {
    let Some(staged) = staged else {
        return;
    };
    let path = staged.to_path_buf();
    match staged.close() {
        Ok(()) => debug!(path = %path.display(), "removed staged body"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "cannot remove staged body"),
    }
}

/// Builder for [`RestingClient`].
///
/// Converter settings (`context_path`, providers, encoders, staging
/// directory) apply on top of the converter set with
/// [`converter`](Self::converter), so set that one first.
pub struct RestingClientBuilder {
    base_url: String,
    converter: RequestConverter,
    interceptors: InterceptorChain,
    transport: Option<Arc<dyn Transport>>,
    config: TransportConfig,
}

impl fmt::Debug for RestingClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestingClientBuilder")
            .field("base_url", &self.base_url)
            .field("converter", &self.converter)
            .field("interceptors", &self.interceptors)
            .field("custom_transport", &self.transport.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl RestingClientBuilder {
    /// Replace the request converter.
    #[must_use]
    pub fn converter(mut self, converter: RequestConverter) -> Self {
        self.converter = converter;
        self
    }

    /// Prefix every endpoint path.
    #[must_use]
    pub fn context_path(mut self, context_path: impl Into<String>) -> Self {
        self.converter = self.converter.with_context_path(context_path);
        self
    }

    /// Set the default header source.
    #[must_use]
    pub fn header_provider(mut self, provider: impl HeaderProvider + 'static) -> Self {
        self.converter = self.converter.with_header_provider(provider);
        self
    }

    /// Set the default path variable source.
    #[must_use]
    pub fn path_variable_provider(mut self, provider: impl PathVariableProvider + 'static) -> Self {
        self.converter = self.converter.with_path_variable_provider(provider);
        self
    }

    /// Replace the query encoder.
    #[must_use]
    pub fn query_encoder(mut self, encoder: QueryEncoder) -> Self {
        self.converter = self.converter.with_query_encoder(encoder);
        self
    }

    /// Replace the multipart encoder.
    #[must_use]
    pub fn multipart_encoder(mut self, encoder: MultipartEncoder) -> Self {
        self.converter = self.converter.with_multipart_encoder(encoder);
        self
    }

    /// Directory for staged upload bodies.
    #[must_use]
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.converter = self.converter.with_staging_dir(dir);
        self
    }

    /// Append an interceptor; interceptors run in the order added.
    #[must_use]
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Use a custom transport instead of [`HyperTransport`].
    #[must_use]
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Configuration for the default [`HyperTransport`]. Ignored when a
    /// custom transport is set.
    #[must_use]
    pub fn transport_config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if the base URL cannot be parsed.
    pub fn build(self) -> Result<RestingClient> {
        let base_url = Url::parse(&self.base_url)?;
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HyperTransport::with_config(self.config)),
        };

        Ok(RestingClient {
            base_url,
            converter: self.converter,
            interceptors: self.interceptors,
            transport,
        })
    }
}
