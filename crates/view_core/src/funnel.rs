//! Step funnel: a named-view selector for multi-step flows.
//!
//! The [`Funnel`] owns the current step. Each render the consumer declares its
//! step views on a fresh [`Steps`] set and renders it; exactly the view whose
//! name equals the current step is evaluated. The funnel never computes a
//! "next" step and never validates transitions: callers always pass the target
//! step explicitly.

use std::{fmt, hash::Hash, sync::Arc};

use indexmap::{map::Entry, IndexMap};
use tokio::sync::watch;
use tracing::{debug, warn};

pub struct Funnel<S> {
    step: Arc<watch::Sender<S>>,
}

impl<S> Funnel<S>
where
    S: Clone + Eq + Hash + fmt::Debug,
{
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { step: Arc::new(tx) }
    }

    pub fn current_step(&self) -> S {
        self.step.borrow().clone()
    }

    pub fn is_at(&self, step: &S) -> bool {
        *self.step.borrow() == *step
    }

    /// Overwrites the current step. Returns `false` when `next` was already
    /// current, in which case subscribers are not notified.
    pub fn set_step(&self, next: S) -> bool {
        replace_step(&self.step, next)
    }

    /// Handle that leaf views can keep to move the funnel.
    pub fn setter(&self) -> StepSetter<S> {
        StepSetter {
            step: Arc::clone(&self.step),
        }
    }

    /// Receiver notified on every effective step change.
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.step.subscribe()
    }

    /// Starts an empty declaration set bound to the current step.
    pub fn steps<'a, V>(&self) -> Steps<'a, S, V> {
        Steps::new(self.current_step())
    }
}

impl<S: fmt::Debug> fmt::Debug for Funnel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Funnel")
            .field("current", &*self.step.borrow())
            .finish()
    }
}

#[derive(Clone)]
pub struct StepSetter<S> {
    step: Arc<watch::Sender<S>>,
}

impl<S> StepSetter<S>
where
    S: Clone + Eq + Hash + fmt::Debug,
{
    pub fn set(&self, next: S) -> bool {
        replace_step(&self.step, next)
    }
}

impl<S: fmt::Debug> fmt::Debug for StepSetter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepSetter")
            .field("current", &*self.step.borrow())
            .finish()
    }
}

fn replace_step<S>(tx: &watch::Sender<S>, next: S) -> bool
where
    S: Eq + fmt::Debug,
{
    tx.send_if_modified(move |current| {
        if *current == next {
            return false;
        }
        debug!(from = ?current, to = ?next, "funnel step changed");
        *current = next;
        true
    })
}

type StepContent<'a, V> = Box<dyn FnOnce() -> V + 'a>;

/// Step declarations for one render pass.
///
/// Lookup is keyed by step name. When a name is declared twice the first
/// declaration wins and the later content is dropped without being evaluated.
pub struct Steps<'a, S, V> {
    current: S,
    declared: IndexMap<S, StepContent<'a, V>>,
}

impl<'a, S, V> Steps<'a, S, V>
where
    S: Eq + Hash + fmt::Debug,
{
    pub fn new(current: S) -> Self {
        Self {
            current,
            declared: IndexMap::new(),
        }
    }

    pub fn step(mut self, name: S, content: impl FnOnce() -> V + 'a) -> Self {
        self.declare(name, content);
        self
    }

    /// Registers a step view. Returns `false` if `name` was already declared.
    pub fn declare(&mut self, name: S, content: impl FnOnce() -> V + 'a) -> bool {
        match self.declared.entry(name) {
            Entry::Occupied(entry) => {
                warn!(step = ?entry.key(), "duplicate funnel step ignored; first declaration wins");
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(Box::new(content));
                true
            }
        }
    }

    /// Declared step names in registration order.
    pub fn declared(&self) -> impl Iterator<Item = &S> {
        self.declared.keys()
    }

    pub fn is_declared(&self, name: &S) -> bool {
        self.declared.contains_key(name)
    }

    /// Evaluates the content of the current step, or `None` when no declared
    /// step matches it.
    pub fn render(mut self) -> Option<V> {
        match self.declared.swap_remove(&self.current) {
            Some(content) => Some(content()),
            None => {
                debug!(
                    step = ?self.current,
                    declared = self.declared.len(),
                    "no funnel step matches the current step; rendering nothing"
                );
                None
            }
        }
    }

    pub fn render_or_else(self, empty: impl FnOnce() -> V) -> V {
        self.render().unwrap_or_else(empty)
    }
}

#[cfg(test)]
#[path = "tests/funnel_tests.rs"]
mod tests;
