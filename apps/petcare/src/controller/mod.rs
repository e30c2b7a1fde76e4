//! Controller layer: UI actions, error modeling, and action dispatch.

pub mod events;
pub mod orchestration;
