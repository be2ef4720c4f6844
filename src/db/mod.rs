//! Vector stores.
//!
//! - `memory` (always available) - brute-force cosine search, process lifetime only
//! - `qdrant` (feature) - Qdrant server over gRPC
//!
//! Enable providers via Cargo features:
//! ```toml
//! knowbase-server = { version = "*", features = ["qdrant"] }
//! ```

#![allow(missing_docs)]

// Vector store abstraction layer
pub mod vectorstore;

#[cfg(feature = "qdrant")]
pub mod qdrant;

// Re-exports
pub use vectorstore::{
    CollectionStats, EmbeddedChunk, InMemoryVectorStore, VectorStore, VectorStoreProvider,
};

#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
