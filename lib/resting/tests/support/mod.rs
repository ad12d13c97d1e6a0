//! In-memory transports for pipeline tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use resting::{Error, ProgressFuture, Result, Transport, WireBody, WireRequest, WireResponse};
use serde::{Deserialize, Serialize};

/// What the echo transport saw, returned as the response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub streamed: bool,
}

/// A request as observed by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct Seen {
    pub request: WireRequest,
    /// For streamed requests: the staged file existed and held this text.
    pub staged: Option<(PathBuf, String)>,
}

type Responder = Arc<dyn Fn(&WireRequest) -> Result<WireResponse> + Send + Sync>;

/// Records every request and answers with a configurable responder.
///
/// `upload` reports `1/4`, `2/4`, `4/4` before answering.
#[derive(Clone)]
pub struct MockTransport {
    seen: Arc<Mutex<Vec<Seen>>>,
    responder: Responder,
}

impl MockTransport {
    pub fn new(responder: impl Fn(&WireRequest) -> Result<WireResponse> + Send + Sync + 'static) -> Self {
        Self {
            seen: Arc::default(),
            responder: Arc::new(responder),
        }
    }

    /// Answers 200 with an [`Echo`] of the request.
    pub fn echo() -> Self {
        Self::new(|request| {
            let echo = Echo {
                method: request.method().to_string(),
                url: request.url().to_string(),
                headers: request.headers().clone(),
                body: match request.body() {
                    WireBody::Empty => String::new(),
                    WireBody::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                    WireBody::File(path) => std::fs::read_to_string(path).unwrap_or_default(),
                },
                streamed: request.is_streamed(),
            };
            let body = serde_json::to_vec(&echo).expect("echo json");
            Ok(WireResponse::new(200, HashMap::new(), body))
        })
    }

    /// Answers with `status` and `body`.
    pub fn status(status: u16, body: &'static str) -> Self {
        Self::new(move |_| {
            Ok(WireResponse::new(
                status,
                HashMap::from([("x-mock".to_string(), "yes".to_string())]),
                body,
            ))
        })
    }

    /// Fails every request as if no response was received.
    pub fn unreachable() -> Self {
        Self::new(|_| Err(Error::connection("connection refused")))
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, request: &WireRequest) {
        let staged = request.file().map(|path| {
            let text = std::fs::read_to_string(path).expect("staged file exists during upload");
            (path.to_path_buf(), text)
        });
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Seen {
                request: request.clone(),
                staged,
            });
    }
}

impl Transport for MockTransport {
    fn send(&self, request: WireRequest) -> BoxFuture<'static, Result<WireResponse>> {
        self.record(&request);
        let result = (self.responder)(&request);
        async move {
            tokio::task::yield_now().await;
            result
        }
        .boxed()
    }

    fn upload(&self, request: WireRequest) -> ProgressFuture<WireResponse> {
        self.record(&request);
        let result = (self.responder)(&request);
        ProgressFuture::with_progress(move |reporter| async move {
            for completed in [1, 2, 4] {
                tokio::task::yield_now().await;
                reporter.report(completed, 4);
            }
            result
        })
    }
}

/// Files currently in `dir`.
pub fn entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .expect("read scratch dir")
        .map(|entry| entry.expect("entry").path())
        .collect()
}
