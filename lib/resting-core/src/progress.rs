//! Futures that report transfer progress.
//!
//! A [`ProgressFuture`] is an ordinary future resolving to `Result<T>` that
//! also carries a progress node. Every combinator returns a new future whose
//! node is registered as a child of the node it was derived from, so events
//! reported at the source reach handlers registered anywhere downstream:
//!
//! ```
//! # async fn demo() -> resting_core::Result<()> {
//! use resting_core::ProgressFuture;
//!
//! let upload = ProgressFuture::with_progress(|reporter| async move {
//!     reporter.report(50, 100);
//!     reporter.report(100, 100);
//!     Ok(42_u32)
//! });
//!
//! let doubled = upload
//!     .map(|n| n * 2)
//!     .on_progress(|event| println!("{:.0}%", event.fraction() * 100.0))
//!     .await?;
//! assert_eq!(doubled, 84);
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures_util::FutureExt as _;
use futures_util::future::BoxFuture;

use crate::{Error, Result};

/// Progress of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressEvent {
    /// Units done so far; never decreases within a transfer.
    pub completed: u64,
    /// Expected units; `0` when unknown.
    pub total: u64,
}

impl ProgressEvent {
    /// Completed share in `0.0..=1.0`, or `0.0` when the total is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total as f64).min(1.0)
        }
    }

    /// `true` once everything is transferred.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

type Handler = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

// ============================================================================
// Progress tree
// ============================================================================

#[derive(Default)]
struct ProgressNode {
    handlers: Mutex<Vec<Handler>>,
    children: Mutex<Vec<Arc<ProgressNode>>>,
}

impl ProgressNode {
    fn subscribe(&self, handler: Handler) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    fn adopt(&self, child: Arc<Self>) {
        self.children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(child);
    }

    /// Own handlers first, then each child in registration order.
    fn emit(&self, event: ProgressEvent) {
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            handler(event);
        }

        let children = self
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for child in children {
            child.emit(event);
        }
    }
}

/// Handle used by a progress source to publish events.
///
/// Events whose `completed` count is lower than the last published one are
/// dropped, so observers always see a non-decreasing sequence. Handlers run
/// outside any lock and may report again; such nested events are delivered
/// after the current one, in report order.
#[derive(Clone)]
pub struct ProgressReporter {
    node: Arc<ProgressNode>,
    state: Arc<Mutex<ReportState>>,
}

#[derive(Default)]
struct ReportState {
    last: Option<u64>,
    pending: VecDeque<ProgressEvent>,
    draining: bool,
}

impl ProgressReporter {
    /// Publish `completed` out of `total` units.
    pub fn report(&self, completed: u64, total: u64) {
        {
            let mut state = self.lock();
            if state.last.is_some_and(|previous| completed < previous) {
                return;
            }
            state.last = Some(completed);
            state.pending.push_back(ProgressEvent { completed, total });
            // Whoever is already draining delivers this event in turn.
            if state.draining {
                return;
            }
            state.draining = true;
        }

        let mut drain = Drain {
            reporter: self,
            finished: false,
        };
        while let Some(event) = drain.next_event() {
            self.node.emit(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the draining role. It is released under the lock once the queue is
/// empty, or on drop if a handler panicked.
struct Drain<'a> {
    reporter: &'a ProgressReporter,
    finished: bool,
}

impl Drain<'_> {
    fn next_event(&mut self) -> Option<ProgressEvent> {
        let mut state = self.reporter.lock();
        let event = state.pending.pop_front();
        if event.is_none() {
            state.draining = false;
            self.finished = true;
        }
        event
    }
}

impl Drop for Drain<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = self.reporter.lock();
            state.pending.clear();
            state.draining = false;
        }
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter").finish_non_exhaustive()
    }
}

// ============================================================================
// ProgressFuture
// ============================================================================

/// A boxed `Result<T>` future with progress notifications.
///
/// Combinators never lose events: `f.map(g).on_progress(h)` and
/// `f.on_progress(h).map(g)` observe the same sequence. Each derived future
/// settles independently, after its own transformation ran.
///
/// Dropping the future cancels the remaining work; callbacks registered with
/// [`finally`](Self::finally) do not run in that case.
#[must_use = "futures do nothing unless awaited"]
pub struct ProgressFuture<T> {
    inner: BoxFuture<'static, Result<T>>,
    node: Arc<ProgressNode>,
}

impl<T: Send + 'static> ProgressFuture<T> {
    /// Wrap a future that reports no progress.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
            node: Arc::default(),
        }
    }

    /// Build a future from a progress source.
    ///
    /// `source` receives the reporter for this future's node and returns
    /// the work to run.
    pub fn with_progress<S, F>(source: S) -> Self
    where
        S: FnOnce(ProgressReporter) -> F,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let node = Arc::<ProgressNode>::default();
        let reporter = ProgressReporter {
            node: Arc::clone(&node),
            state: Arc::default(),
        };
        Self {
            inner: source(reporter).boxed(),
            node,
        }
    }

    /// An already settled future.
    pub fn ready(result: Result<T>) -> Self {
        Self::new(futures_util::future::ready(result))
    }

    /// An already failed future.
    pub fn err(error: Error) -> Self {
        Self::ready(Err(error))
    }

    /// Register a progress handler on this future.
    pub fn on_progress<H>(self, handler: H) -> Self
    where
        H: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.node.subscribe(Arc::new(handler));
        self
    }

    fn derive<U, F>(self, build: impl FnOnce(BoxFuture<'static, Result<T>>) -> F) -> ProgressFuture<U>
    where
        F: Future<Output = Result<U>> + Send + 'static,
    {
        let node = Arc::<ProgressNode>::default();
        self.node.adopt(Arc::clone(&node));
        ProgressFuture {
            inner: build(self.inner).boxed(),
            node,
        }
    }

    /// Transform the value.
    pub fn map<U, F>(self, f: F) -> ProgressFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.derive(|inner| async move { inner.await.map(f) })
    }

    /// Transform the value with a fallible function.
    pub fn try_map<U, F>(self, f: F) -> ProgressFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U> + Send + 'static,
    {
        self.derive(|inner| async move { inner.await.and_then(f) })
    }

    /// Continue with another progress future built from the value.
    ///
    /// Progress reported by the continuation is forwarded to the returned
    /// future as well.
    pub fn chain<U, F>(self, f: F) -> ProgressFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> ProgressFuture<U> + Send + 'static,
    {
        let node = Arc::<ProgressNode>::default();
        self.node.adopt(Arc::clone(&node));
        let forward_to = Arc::clone(&node);
        let source = self.inner;
        ProgressFuture {
            inner: async move {
                let next = f(source.await?);
                next.node.adopt(forward_to);
                next.inner.await
            }
            .boxed(),
            node,
        }
    }

    /// Recover from a failure with another progress future.
    pub fn recover<F>(self, f: F) -> Self
    where
        F: FnOnce(Error) -> Self + Send + 'static,
    {
        let node = Arc::<ProgressNode>::default();
        self.node.adopt(Arc::clone(&node));
        let forward_to = Arc::clone(&node);
        let source = self.inner;
        Self {
            inner: async move {
                match source.await {
                    Ok(value) => Ok(value),
                    Err(error) => {
                        let next = f(error);
                        next.node.adopt(forward_to);
                        next.inner.await
                    }
                }
            }
            .boxed(),
            node,
        }
    }

    /// Observe the value without changing it.
    pub fn peek<F>(self, f: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.derive(|inner| async move {
            let result = inner.await;
            if let Ok(value) = &result {
                f(value);
            }
            result
        })
    }

    /// Observe the error without changing it.
    pub fn inspect_err<F>(self, f: F) -> Self
    where
        F: FnOnce(&Error) + Send + 'static,
    {
        self.derive(|inner| async move {
            let result = inner.await;
            if let Err(error) = &result {
                f(error);
            }
            result
        })
    }

    /// Run `f` once this future settles, whatever the outcome.
    pub fn finally<F>(self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.derive(|inner| async move {
            let result = inner.await;
            f();
            result
        })
    }
}

impl<T> Future for ProgressFuture<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for ProgressFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressFuture").finish_non_exhaustive()
    }
}
