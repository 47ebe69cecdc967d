//! Docweave Runtime: the context-assembly engine.
//!
//! [`ContextEngine`] keeps the document link graph in step with document
//! change events and turns similarity hits into the final, link-expanded
//! context list.

pub mod orchestrator;
pub mod types;

pub use orchestrator::ContextEngine;
pub use types::*;
