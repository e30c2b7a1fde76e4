use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::error::ApiException;
use tokio::{
    sync::{broadcast, Notify},
    time::timeout,
};

use crate::query::{CacheEvent, Query, QueryError, QueryKey};

/// Query whose fetches block until released, failing the first `failures`
/// calls (and every call while `failing` is set) with "network error".
#[derive(Clone)]
pub(crate) struct ScriptedQuery {
    pub(crate) key: &'static str,
    pub(crate) calls: Arc<AtomicUsize>,
    pub(crate) release: Arc<Notify>,
    pub(crate) failures: usize,
    pub(crate) value: Arc<AtomicU32>,
    pub(crate) failing: Arc<AtomicBool>,
}

impl ScriptedQuery {
    pub(crate) fn new(key: &'static str) -> Self {
        Self {
            key,
            calls: Arc::new(AtomicUsize::new(0)),
            release: Arc::new(Notify::new()),
            failures: 0,
            value: Arc::new(AtomicU32::new(7)),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn failing_first(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    /// Makes every later fetch fail until switched back.
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Query for ScriptedQuery {
    type Output = u32;

    fn key(&self) -> QueryKey {
        QueryKey::from(self.key)
    }

    async fn fetch(&self) -> Result<u32, QueryError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        if call < self.failures || self.failing.load(Ordering::SeqCst) {
            return Err(ApiException::network("network error").into());
        }
        Ok(self.value.load(Ordering::SeqCst))
    }
}

pub(crate) async fn next_event(rx: &mut broadcast::Receiver<CacheEvent>) -> CacheEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("cache event in time")
        .expect("event channel open")
}
