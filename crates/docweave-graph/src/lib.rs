//! Docweave Graph: in-memory document link graph.
//!
//! Rebuilt from source documents at startup and mutated incrementally on
//! change events; never persisted.

mod cycles;
pub mod graph;

pub use graph::{GraphStats, LinkGraph};
