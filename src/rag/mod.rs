//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! # Module Structure
//!
//! - [`reader`] - Text extraction from uploaded files
//! - [`chunker`] - Token-based splitting under a fixed [`ChunkPolicy`](chunker::ChunkPolicy)
//! - [`embeddings`] - Embedding backends (Ollama, OpenAI-compatible, fastembed)
//! - [`store`] - Text-level knowledge store over a vector store
//! - [`prompt`] / [`references`] - Prompt and citation formatting
//! - [`ingest`] - [`DocumentService`], the upload flow
//! - [`query`] - [`ChatService`], the question flow
//!
//! # Flow
//!
//! ```text
//! upload:  bytes ─▶ reader ─▶ chunker ─▶ tag metadata ─▶ store.add
//! chat:    question ─▶ store.similarity_search ─▶ prompt ─▶ LLM ─▶ answer + references
//! ```

pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod prompt;
pub mod query;
pub mod reader;
pub mod references;
pub mod store;

pub use ingest::{DocumentService, IngestOutcome};
pub use query::{ChatService, QueryOutcome};

/// Chunks retrieved per question.
pub const TOP_K: usize = 3;
/// Minimum cosine similarity for a chunk to count as context.
pub const SIMILARITY_THRESHOLD: f32 = 0.6;
/// Sampling temperature for answers.
pub const TEMPERATURE: f32 = 0.7;
/// Completion length cap for answers.
pub const MAX_TOKENS: u32 = 500;
