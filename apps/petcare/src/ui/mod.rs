//! Terminal UI: app shell and view renderer.

pub mod app;
pub mod render;
