//! docqa-core
//!
//! Shared types, errors, configuration and the ingestion-side text pipeline
//! (document loading, sentence splitting, semantic chunking).

pub mod chunking;
pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use error::{Error, IndexKind, Result};
pub use types::{Chunk, ChunkMetadata};
