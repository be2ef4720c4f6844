//! # KnowBase - a minimal RAG knowledge base server
//!
//! Upload documents, then ask questions that are answered from them with
//! citations.
//!
//! ## Overview
//!
//! KnowBase can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `knowbase-server` binary
//! 2. **As a library** - Assemble the services with your own collaborators
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use knowbase::{
//!     db::InMemoryVectorStore,
//!     rag::{chunker::TokenChunker, reader::ExtractingReader, store::EmbeddingStore},
//!     ChatService, DocumentService, Provider,
//! };
//! use std::sync::Arc;
//!
//! let llm = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2".to_string(),
//! }
//! .create_client()
//! .await?;
//!
//! let store = Arc::new(EmbeddingStore::new(embedder, Arc::new(InMemoryVectorStore::new()), "knowbase"));
//! store.ensure_collection().await?;
//!
//! let documents = DocumentService::new(
//!     Arc::new(ExtractingReader::new()),
//!     Arc::new(TokenChunker::new()?),
//!     store.clone(),
//! );
//! let chat = ChatService::new(store, Arc::from(llm));
//!
//! println!("{}", documents.upload(b"Rust is a systems language.", "notes.txt").await.message());
//! println!("{}", chat.answer("What is Rust?").await.answer());
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama chat and embeddings (default) |
//! | `openai` | OpenAI-compatible chat completions (default) |
//! | `qdrant` | Qdrant vector database |
//! | `local-embeddings` | In-process embeddings via fastembed |
//! | `swagger-ui` | Interactive API docs at `/swagger-ui/` |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`db`] - Vector stores (in-memory, Qdrant)
//! - [`llm`] - LLM client implementations
//! - [`rag`] - Ingestion and question answering pipeline
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Vector store clients (in-memory, Qdrant).
pub mod db;
/// LLM provider clients and abstractions.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{GenerationParams, LLMClient, Provider};
pub use rag::{ChatService, DocumentService, IngestOutcome, QueryOutcome};
pub use types::{AppError, Result};
pub use utils::toml_config::KnowbaseConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded server configuration
    pub config: Arc<KnowbaseConfig>,
    /// Question answering
    pub chat_service: Arc<ChatService>,
    /// Document ingestion
    pub document_service: Arc<DocumentService>,
}
