//! Keyed query cache.
//!
//! A [`QueryCache`] stores the results of asynchronous reads by [`QueryKey`].
//! A miss spawns exactly one fetch task per key; further reads of the same key
//! observe `Pending` until the fetch settles. Every fetch carries the entry's
//! generation, and a result whose generation no longer matches (because the
//! entry was invalidated, reset or refetched meanwhile) is discarded.

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
};

use async_trait::async_trait;
use shared::error::ApiException;
use thiserror::Error;
use tokio::{runtime::Handle, sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::outcome::AsyncOutcome;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, T>(segments: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for QueryKey {
    fn from(value: &str) -> Self {
        Self::new(value.split('/').filter(|segment| !segment.is_empty()))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Api(#[from] ApiException),
    #[error("{0}")]
    Failed(String),
    #[error("query {key} holds a value of a different type")]
    TypeMismatch { key: QueryKey },
    #[error("query cache requires a tokio runtime: {0}")]
    NoRuntime(String),
}

impl QueryError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Human-readable message without the error code prefix.
    pub fn message(&self) -> String {
        match self {
            QueryError::Api(exc) => exc.message.clone(),
            other => other.to_string(),
        }
    }
}

/// An asynchronous read addressed by a cache key.
#[async_trait]
pub trait Query: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    fn key(&self) -> QueryKey;

    async fn fetch(&self) -> Result<Self::Output, QueryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Settled { key: QueryKey, ok: bool },
    Invalidated { key: QueryKey },
}

impl CacheEvent {
    pub fn key(&self) -> &QueryKey {
        match self {
            CacheEvent::Settled { key, .. } | CacheEvent::Invalidated { key } => key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Loading,
    Ready,
    /// Ready value still visible while a newer fetch runs.
    Refreshing,
    Failed,
}

type CachedValue = Arc<dyn Any + Send + Sync>;

enum Slot {
    Loading,
    Ready(CachedValue),
    Failed(QueryError),
}

struct Entry {
    slot: Slot,
    generation: u64,
    task: Option<JoinHandle<()>>,
    refreshing: bool,
}

impl Entry {
    fn status(&self) -> EntryStatus {
        match self.slot {
            Slot::Loading => EntryStatus::Loading,
            Slot::Ready(_) if self.refreshing => EntryStatus::Refreshing,
            Slot::Ready(_) => EntryStatus::Ready,
            Slot::Failed(_) => EntryStatus::Failed,
        }
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct CacheInner {
    runtime: Handle,
    entries: Mutex<HashMap<QueryKey, Entry>>,
    generations: AtomicU64,
    events: broadcast::Sender<CacheEvent>,
}

impl CacheInner {
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn emit(&self, event: CacheEvent) {
        // No subscribers is fine: nothing is waiting on this key.
        let _ = self.events.send(event);
    }

    fn settle(&self, key: &QueryKey, generation: u64, result: Result<CachedValue, QueryError>) {
        let ok = result.is_ok();
        {
            let mut entries = self.lock_entries();
            let Some(entry) = entries.get_mut(key) else {
                debug!(query = %key, generation, "discarding result of invalidated query");
                return;
            };
            if entry.generation != generation {
                debug!(
                    query = %key,
                    generation,
                    current = entry.generation,
                    "discarding stale fetch result"
                );
                return;
            }

            entry.task = None;
            let refreshing = std::mem::take(&mut entry.refreshing);
            match result {
                Ok(value) => {
                    info!(query = %key, generation, "fetch resolved");
                    entry.slot = Slot::Ready(value);
                }
                // A failed refresh keeps the previous value readable.
                Err(err) if refreshing && matches!(entry.slot, Slot::Ready(_)) => {
                    warn!(query = %key, generation, error = %err, "refresh rejected; keeping previous value");
                }
                Err(err) => {
                    warn!(query = %key, generation, error = %err, "fetch rejected");
                    entry.slot = Slot::Failed(err);
                }
            }
        }
        self.emit(CacheEvent::Settled {
            key: key.clone(),
            ok,
        });
    }
}

impl Drop for CacheInner {
    fn drop(&mut self) {
        let entries = self.entries.get_mut().unwrap_or_else(PoisonError::into_inner);
        for entry in entries.values_mut() {
            entry.abort_task();
        }
    }
}

/// Shared, cloneable handle to the query cache.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    pub fn new(runtime: Handle) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(CacheInner {
                runtime,
                entries: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Builds a cache on the runtime of the calling context.
    pub fn try_current() -> Result<Self, QueryError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|err| QueryError::NoRuntime(err.to_string()))
    }

    /// Returns the cached value, the held failure, or `Pending`. A miss starts
    /// the fetch.
    pub fn read<Q>(&self, query: &Q) -> AsyncOutcome<Arc<Q::Output>, QueryError>
    where
        Q: Query + Clone,
    {
        let key = query.key();
        let mut entries = self.inner.lock_entries();
        if let Some(entry) = entries.get(&key) {
            return match &entry.slot {
                Slot::Ready(value) => downcast::<Q::Output>(&key, value).into(),
                Slot::Failed(err) => AsyncOutcome::Rejected(err.clone()),
                Slot::Loading => AsyncOutcome::Pending,
            };
        }

        let generation = self.inner.next_generation();
        let task = self.spawn_fetch(query.clone(), key.clone(), generation);
        entries.insert(
            key,
            Entry {
                slot: Slot::Loading,
                generation,
                task: Some(task),
                refreshing: false,
            },
        );
        AsyncOutcome::Pending
    }

    /// Starts a new fetch for the query's key. A ready value stays readable
    /// until a successful result replaces it, and survives a failed one; a
    /// failed or missing entry goes back to loading.
    pub fn refetch<Q>(&self, query: &Q)
    where
        Q: Query + Clone,
    {
        let key = query.key();
        let mut entries = self.inner.lock_entries();
        let generation = self.inner.next_generation();
        let task = self.spawn_fetch(query.clone(), key.clone(), generation);

        let entry = entries.entry(key).or_insert_with(|| Entry {
            slot: Slot::Loading,
            generation,
            task: None,
            refreshing: false,
        });
        entry.abort_task();
        entry.generation = generation;
        entry.task = Some(task);
        match entry.slot {
            Slot::Ready(_) => entry.refreshing = true,
            Slot::Failed(_) => entry.slot = Slot::Loading,
            Slot::Loading => {}
        }
    }

    /// Drops the entry for `key`, aborting its fetch. Returns whether an entry
    /// existed.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let removed = self.inner.lock_entries().remove(key);
        match removed {
            Some(mut entry) => {
                entry.abort_task();
                debug!(query = %key, "query invalidated");
                self.inner.emit(CacheEvent::Invalidated { key: key.clone() });
                true
            }
            None => false,
        }
    }

    /// Drops every failed entry so the next read refetches it.
    pub fn reset_failed(&self) -> usize {
        self.reset_failed_where(|_| true)
    }

    /// Drops the failed entries among `keys`.
    pub fn reset_failed_in(&self, keys: &[QueryKey]) -> usize {
        self.reset_failed_where(|key| keys.contains(key))
    }

    fn reset_failed_where(&self, selected: impl Fn(&QueryKey) -> bool) -> usize {
        let mut removed = Vec::new();
        self.inner.lock_entries().retain(|key, entry| {
            let drop_it = matches!(entry.slot, Slot::Failed(_)) && selected(key);
            if drop_it {
                removed.push(key.clone());
            }
            !drop_it
        });

        for key in &removed {
            debug!(query = %key, "failed query reset");
            self.inner.emit(CacheEvent::Invalidated { key: key.clone() });
        }
        removed.len()
    }

    pub fn state(&self, key: &QueryKey) -> Option<EntryStatus> {
        self.inner.lock_entries().get(key).map(Entry::status)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    fn spawn_fetch<Q: Query>(&self, query: Q, key: QueryKey, generation: u64) -> JoinHandle<()> {
        info!(query = %key, generation, "fetch started");
        let inner: Weak<CacheInner> = Arc::downgrade(&self.inner);
        self.inner.runtime.spawn(async move {
            let result = query
                .fetch()
                .await
                .map(|value| Arc::new(value) as CachedValue);
            match inner.upgrade() {
                Some(inner) => inner.settle(&key, generation, result),
                None => debug!(query = %key, "query cache dropped before fetch settled"),
            }
        })
    }
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.lock_entries().len())
            .finish()
    }
}

fn downcast<T>(key: &QueryKey, value: &CachedValue) -> Result<Arc<T>, QueryError>
where
    T: Send + Sync + 'static,
{
    Arc::clone(value)
        .downcast::<T>()
        .map_err(|_| QueryError::TypeMismatch { key: key.clone() })
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
