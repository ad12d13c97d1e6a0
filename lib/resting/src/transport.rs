//! HTTP transport using hyper-util.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::future::BoxFuture;
use futures_util::{FutureExt, TryStreamExt, stream};
use http_body::Frame;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio::io::AsyncReadExt;
use tower::limit::ConcurrencyLimitLayer;
use tower::util::BoxCloneService;
use tower::{Layer, ServiceExt};
use tower_service::Service;
use tracing::debug;

use crate::{
    Error, ProgressFuture, ProgressReporter, Result, Transport, WireBody, WireRequest,
    WireResponse,
    config::{TransportConfig, TransportConfigBuilder},
    connector::https_connector,
};

type RequestBody = UnsyncBoxBody<Bytes, io::Error>;

/// A wire request plus the reporter for its upload progress, if any.
struct Outgoing {
    request: WireRequest,
    reporter: Option<ProgressReporter>,
}

type BoxedService = BoxCloneService<Outgoing, WireResponse, Error>;

/// Makes the boxed service shareable across threads.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, outgoing: Outgoing) -> BoxFuture<'static, Result<WireResponse>> {
        let service = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        service.oneshot(outgoing).boxed()
    }
}

// ============================================================================
// Raw transport
// ============================================================================

#[derive(Clone)]
struct RawHyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, RequestBody>,
    config: TransportConfig,
}

impl RawHyperTransport {
    fn new(config: TransportConfig) -> Self {
        let connector = https_connector(config.connect_timeout);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    async fn build_hyper_request(
        &self,
        outgoing: Outgoing,
    ) -> Result<http::Request<RequestBody>> {
        let Outgoing { request, reporter } = outgoing;
        let (method, url, headers, body) = request.into_parts();

        let mut builder = http::Request::builder().method(method).uri(url.as_str());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body: RequestBody = match body {
            WireBody::Empty => Empty::<Bytes>::new()
                .map_err(|never| -> io::Error { match never {} })
                .boxed_unsync(),
            WireBody::Bytes(bytes) => Full::new(bytes)
                .map_err(|never| -> io::Error { match never {} })
                .boxed_unsync(),
            WireBody::File(path) => {
                let (body, length) = self.file_body(path, reporter).await?;
                if !headers
                    .keys()
                    .any(|name| name.eq_ignore_ascii_case(http::header::CONTENT_LENGTH.as_str()))
                {
                    builder = builder.header(http::header::CONTENT_LENGTH, length);
                }
                body
            }
        };

        builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    /// Stream a staged file in chunks, reporting bytes handed to the connection.
    async fn file_body(
        &self,
        path: PathBuf,
        reporter: Option<ProgressReporter>,
    ) -> Result<(RequestBody, u64)> {
        let file = tokio::fs::File::open(&path).await?;
        let total = file.metadata().await?.len();
        let chunk_size = self.config.upload_chunk_size;
        debug!(path = %path.display(), total, "streaming staged body");

        let chunks = stream::try_unfold((file, 0_u64), move |(mut file, sent)| {
            let reporter = reporter.clone();
            async move {
                let mut chunk = BytesMut::with_capacity(chunk_size);
                let read = file.read_buf(&mut chunk).await?;
                if read == 0 {
                    return Ok::<_, io::Error>(None);
                }
                let sent = sent + read as u64;
                if let Some(reporter) = &reporter {
                    reporter.report(sent, total);
                }
                Ok(Some((chunk.freeze(), (file, sent))))
            }
        });

        let body = StreamBody::new(chunks.map_ok(Frame::data)).boxed_unsync();
        Ok((body, total))
    }

    async fn execute(&self, outgoing: Outgoing) -> Result<WireResponse> {
        let hyper_request = self.build_hyper_request(outgoing).await?;

        let response = tokio::time::timeout(self.config.timeout, self.inner.request(hyper_request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let response_headers = extract_headers(response.headers());

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(WireResponse::new(status, response_headers, body))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Service<Outgoing> for RawHyperTransport {
    type Response = WireResponse;
    type Error = Error;
    type Future = BoxFuture<'static, Result<WireResponse>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, outgoing: Outgoing) -> Self::Future {
        let transport = self.clone();
        async move { transport.execute(outgoing).await }.boxed()
    }
}

// ============================================================================
// Public transport
// ============================================================================

/// [`Transport`] over hyper-util with connection pooling and rustls TLS.
///
/// In-memory bodies are sent as-is. Streamed bodies are read from their
/// staged file in `upload_chunk_size` chunks, each chunk reporting the bytes
/// sent so far.
///
/// ```no_run
/// use std::time::Duration;
/// use resting::HyperTransport;
///
/// let transport = HyperTransport::builder()
///     .timeout(Duration::from_secs(60))
///     .concurrency_limit(8)
///     .build();
/// # let _ = transport;
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    service: SyncService,
    config: TransportConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a transport with custom configuration.
    #[must_use]
    pub fn with_config(config: TransportConfig) -> Self {
        Self::builder().config(config).build()
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: WireRequest) -> BoxFuture<'static, Result<WireResponse>> {
        self.service.call(Outgoing {
            request,
            reporter: None,
        })
    }

    fn upload(&self, request: WireRequest) -> ProgressFuture<WireResponse> {
        let service = self.service.clone();
        ProgressFuture::with_progress(move |reporter| {
            service.call(Outgoing {
                request,
                reporter: Some(reporter),
            })
        })
    }
}

/// Builder for [`HyperTransport`].
#[derive(Debug, Clone, Default)]
pub struct HyperTransportBuilder {
    config: TransportConfigBuilder,
    concurrency_limit: Option<usize>,
}

impl HyperTransportBuilder {
    /// Start from a complete configuration; later setters override it.
    #[must_use]
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Set the bytes read per upload progress event.
    #[must_use]
    pub fn upload_chunk_size(mut self, bytes: usize) -> Self {
        self.config = self.config.upload_chunk_size(bytes);
        self
    }

    /// Limit the number of requests in flight; extra requests wait.
    #[must_use]
    pub const fn concurrency_limit(mut self, max: usize) -> Self {
        self.concurrency_limit = Some(max);
        self
    }

    /// Build the transport.
    #[must_use]
    pub fn build(self) -> HyperTransport {
        let config = self.config.build();
        let raw = RawHyperTransport::new(config.clone());

        let mut service: BoxedService = BoxCloneService::new(raw);
        if let Some(max) = self.concurrency_limit {
            service = BoxCloneService::new(ConcurrencyLimitLayer::new(max).layer(service));
        }

        HyperTransport {
            service: SyncService::new(service),
            config,
        }
    }
}

/// Extract response headers as a `HashMap`.
///
/// Repeated fields are joined with `", "` in arrival order. Values that are
/// not visible ASCII are skipped.
fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
    headers
        .keys()
        .filter_map(|name| {
            let values: Vec<&str> = headers
                .get_all(name)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .collect();
            (!values.is_empty()).then(|| (name.to_string(), values.join(", ")))
        })
        .collect()
}
