//! Mock collaborators for integration tests.
//!
//! These stand in for the chat model and the embedding model so the HTTP
//! layer and both pipelines can be exercised without network access.

#![allow(dead_code)]

use async_trait::async_trait;
use knowbase::llm::{GenerationParams, LLMClient};
use knowbase::rag::embeddings::Embedder;
use knowbase::types::{AppError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Mock LLM client with a fixed response.
///
/// Every prompt it receives is recorded, so tests can check what the
/// question flow actually sent.
///
/// ```ignore
/// let client = MockLLMClient::new("Hello, world!");
/// let failing = MockLLMClient::failing();
/// ```
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    prompts: Arc<Mutex<Vec<(String, GenerationParams)>>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    /// The most recent prompt and its parameters.
    pub fn last_prompt(&self) -> Option<(String, GenerationParams)> {
        self.prompts.lock().last().cloned()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        self.prompts.lock().push((prompt.to_string(), *params));
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Deterministic bag-of-keywords embedder.
///
/// One dimension per keyword (substring match, case-insensitive) plus a final
/// dimension set only when no keyword matches, so unrelated texts are
/// orthogonal to every document.
pub struct KeywordEmbedder {
    keywords: Vec<&'static str>,
}

impl KeywordEmbedder {
    pub fn new(keywords: Vec<&'static str>) -> Self {
        Self { keywords }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let mut vector: Vec<f32> = self
            .keywords
            .iter()
            .map(|k| if lowered.contains(k) { 1.0 } else { 0.0 })
            .collect();

        let matched = vector.iter().any(|v| *v > 0.0);
        vector.push(if matched { 0.0 } else { 1.0 });
        vector
    }
}

impl Default for KeywordEmbedder {
    fn default() -> Self {
        Self::new(vec![
            "knowbase", "pdf", "word", "text", "upload", "rust", "ownership", "weather",
        ])
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.keywords.len() + 1
    }

    fn model_name(&self) -> &str {
        "keyword-embedder"
    }
}
