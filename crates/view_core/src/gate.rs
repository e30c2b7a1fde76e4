//! Async gate: one place for a subtree to report "not ready yet" or "failed".
//!
//! Children are evaluated through a [`GateScope`]. Reading an unresolved query
//! yields [`Interrupt::Suspended`], any error converted with `?` yields
//! [`Interrupt::Failed`]; both propagate out of the children closure and the
//! gate swaps in its pending or rejected fallback. A failure is held until the
//! gate is retried, and while it is held the children are not evaluated.
//!
//! Only errors returned through the closure are caught. A panic inside the
//! children is not turned into a rejection and unwinds through `render`.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    outcome::AsyncOutcome,
    query::{Query, QueryCache, QueryError, QueryKey},
    view::View,
};

pub const DEFAULT_REJECTED_TITLE: &str = "Please try again in a moment.";
pub const DEFAULT_RETRY_LABEL: &str = "Retry";

/// Error captured by a gate. Only the message is kept; the origin (failed
/// read or any other error raised by the children) is not distinguished.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GateError {
    message: String,
    key: Option<QueryKey>,
}

impl GateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            key: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Key of the failed read, when the error came from one.
    pub fn key(&self) -> Option<&QueryKey> {
        self.key.as_ref()
    }

    fn from_read(key: QueryKey, err: &QueryError) -> Self {
        Self {
            message: err.message(),
            key: Some(key),
        }
    }
}

impl From<QueryError> for GateError {
    fn from(value: QueryError) -> Self {
        Self::new(value.message())
    }
}

impl From<anyhow::Error> for GateError {
    fn from(value: anyhow::Error) -> Self {
        Self::new(format!("{value:#}"))
    }
}

/// Why evaluation of a gate's children stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    Suspended { key: QueryKey },
    Failed(GateError),
}

impl From<GateError> for Interrupt {
    fn from(value: GateError) -> Self {
        Interrupt::Failed(value)
    }
}

impl From<QueryError> for Interrupt {
    fn from(value: QueryError) -> Self {
        Interrupt::Failed(value.into())
    }
}

impl From<anyhow::Error> for Interrupt {
    fn from(value: anyhow::Error) -> Self {
        Interrupt::Failed(value.into())
    }
}

/// Request token handed to rejected fallbacks. Requesting a retry takes
/// effect on the gate's next render.
#[derive(Debug, Clone)]
pub struct Retry {
    gate: Arc<str>,
    requested: Arc<AtomicBool>,
}

impl Retry {
    pub fn request(&self) {
        debug!(gate = %self.gate, "retry requested");
        self.requested.store(true, Ordering::Release);
    }

    pub fn gate(&self) -> &str {
        &self.gate
    }
}

impl PartialEq for Retry {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.requested, &other.requested)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Pending,
    Rejected,
    Ready,
}

/// Read access for a gate's children. Records which keys were read so a retry
/// can reset exactly those.
pub struct GateScope<'c> {
    cache: &'c QueryCache,
    keys: Vec<QueryKey>,
}

impl<'c> GateScope<'c> {
    pub fn cache(&self) -> &'c QueryCache {
        self.cache
    }

    pub fn read<Q>(&mut self, query: &Q) -> Result<Arc<Q::Output>, Interrupt>
    where
        Q: Query + Clone,
    {
        let key = query.key();
        if !self.keys.contains(&key) {
            self.keys.push(key.clone());
        }
        match self.cache.read(query) {
            AsyncOutcome::Ready(value) => Ok(value),
            AsyncOutcome::Pending => Err(Interrupt::Suspended { key }),
            AsyncOutcome::Rejected(err) => Err(Interrupt::Failed(GateError::from_read(key, &err))),
        }
    }
}

type PendingFallback<A> = Box<dyn Fn() -> View<A>>;
type RejectedFallback<A> = Box<dyn Fn(&GateError, Retry) -> View<A>>;

pub struct AsyncGate<A> {
    name: Arc<str>,
    pending_fallback: Option<PendingFallback<A>>,
    rejected_fallback: Option<RejectedFallback<A>>,
    held: Option<GateError>,
    retry_requested: Arc<AtomicBool>,
    keys: Vec<QueryKey>,
    status: GateStatus,
}

impl<A> AsyncGate<A> {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: name.into(),
            pending_fallback: None,
            rejected_fallback: None,
            held: None,
            retry_requested: Arc::new(AtomicBool::new(false)),
            keys: Vec::new(),
            status: GateStatus::Pending,
        }
    }

    pub fn pending_fallback(mut self, fallback: impl Fn() -> View<A> + 'static) -> Self {
        self.pending_fallback = Some(Box::new(fallback));
        self
    }

    pub fn rejected_fallback(
        mut self,
        fallback: impl Fn(&GateError, Retry) -> View<A> + 'static,
    ) -> Self {
        self.rejected_fallback = Some(Box::new(fallback));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> GateStatus {
        self.status
    }

    pub fn error(&self) -> Option<&GateError> {
        self.held.as_ref()
    }

    /// Whether the last evaluation read `key`.
    pub fn waits_on(&self, key: &QueryKey) -> bool {
        self.keys.contains(key)
    }

    pub fn retry_handle(&self) -> Retry {
        Retry {
            gate: Arc::clone(&self.name),
            requested: Arc::clone(&self.retry_requested),
        }
    }

    /// Clears the held error and resets the failed reads of the last
    /// evaluation (every failed read when none were recorded). The next
    /// render evaluates the children from scratch.
    pub fn retry(&mut self, cache: &QueryCache) {
        self.retry_requested.store(false, Ordering::Release);
        let cleared = self.held.take();
        let reset = if self.keys.is_empty() {
            cache.reset_failed()
        } else {
            cache.reset_failed_in(&self.keys)
        };
        debug!(
            gate = %self.name,
            had_error = cleared.is_some(),
            reset,
            "gate retried"
        );
        self.transition(GateStatus::Pending);
    }

    /// Evaluates `children` and returns exactly one of: the pending fallback,
    /// the rejected fallback, or the children's view.
    pub fn render<F>(&mut self, cache: &QueryCache, children: F) -> View<A>
    where
        F: FnOnce(&mut GateScope<'_>) -> Result<View<A>, Interrupt>,
        A: From<Retry>,
    {
        if self.retry_requested.swap(false, Ordering::AcqRel) {
            self.retry(cache);
        }

        if self.held.is_some() {
            self.transition(GateStatus::Rejected);
        }
        if let Some(err) = &self.held {
            return self.rejected_view(err);
        }

        let mut scope = GateScope {
            cache,
            keys: Vec::new(),
        };
        let outcome = children(&mut scope);
        self.keys = scope.keys;

        match outcome {
            Ok(view) => {
                self.transition(GateStatus::Ready);
                view
            }
            Err(Interrupt::Suspended { key }) => {
                debug!(gate = %self.name, query = %key, "gate waiting on query");
                self.transition(GateStatus::Pending);
                self.pending_view()
            }
            Err(Interrupt::Failed(err)) => {
                warn!(gate = %self.name, error = %err, "gate caught error");
                self.transition(GateStatus::Rejected);
                let view = self.rejected_view(&err);
                self.held = Some(err);
                view
            }
        }
    }

    fn transition(&mut self, next: GateStatus) {
        if self.status != next {
            debug!(gate = %self.name, from = ?self.status, to = ?next, "gate status changed");
            self.status = next;
        }
    }

    fn pending_view(&self) -> View<A> {
        match &self.pending_fallback {
            Some(fallback) => fallback(),
            None => View::Spinner,
        }
    }

    fn rejected_view(&self, err: &GateError) -> View<A>
    where
        A: From<Retry>,
    {
        let retry = self.retry_handle();
        match &self.rejected_fallback {
            Some(fallback) => fallback(err, retry),
            None => View::column([
                View::text(DEFAULT_REJECTED_TITLE),
                View::text(err.message()),
                View::button(DEFAULT_RETRY_LABEL, A::from(retry)),
            ]),
        }
    }
}

impl<A> fmt::Debug for AsyncGate<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncGate")
            .field("name", &self.name)
            .field("status", &self.status)
            .field("held", &self.held)
            .field("keys", &self.keys)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/gate_tests.rs"]
mod tests;
