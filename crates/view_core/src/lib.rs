//! Control-flow primitives for screen-style UIs: a step funnel that renders
//! one named view at a time, and an async gate that turns pending or failed
//! data dependencies into fallbacks, backed by a keyed query cache.

pub mod funnel;
pub mod gate;
pub mod outcome;
pub mod query;
pub mod view;

pub use funnel::{Funnel, StepSetter, Steps};
pub use gate::{AsyncGate, GateError, GateScope, GateStatus, Interrupt, Retry};
pub use outcome::AsyncOutcome;
pub use query::{CacheEvent, EntryStatus, Query, QueryCache, QueryError, QueryKey};
pub use view::View;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
