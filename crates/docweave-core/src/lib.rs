//! Docweave Core: shared data model, configuration, errors, fingerprinting.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod types;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use types::*;
