//! LLM Provider Clients and Abstractions
//!
//! Chat-completion backends live behind the [`LLMClient`] trait so the query
//! orchestrator never depends on a concrete provider.
//!
//! # Supported Providers
//!
//! - `ollama` (default feature) - Local Ollama server via `ollama-rs`
//! - `openai` (default feature) - OpenAI-compatible endpoints via `async-openai`
//!
//! # Example
//!
//! ```ignore
//! use knowbase::llm::{GenerationParams, Provider};
//!
//! let client = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2".to_string(),
//! }
//! .create_client()
//! .await?;
//!
//! let answer = client.generate("What is 2+2?", &GenerationParams::default()).await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{GenerationParams, LLMClient, Provider};
