//! Docweave Store: the document store contract consumed by the context engine.
//!
//! Two backends ship with the crate: [`MemoryStore`] for tests and embedding
//! hosts that already hold documents in memory, and [`FsDocumentStore`] which
//! serves a directory of markdown files.

pub mod frontmatter;
pub mod fs;
pub mod memory;
pub mod traits;

pub use fs::FsDocumentStore;
pub use memory::MemoryStore;
pub use traits::DocumentStore;
