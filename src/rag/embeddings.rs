//! Dense embedding backends.
//!
//! An [`Embedder`] turns chunk texts and queries into vectors. The vector
//! store never sees text, and the orchestrators never see vectors.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Text embedding model.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch, returning one vector per input in the same order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_texts(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Embedding("Embedder returned no vector".to_string()))
    }

    /// Dimensionality of produced vectors.
    fn dimensions(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Embedder selection, resolved from configuration.
#[derive(Debug, Clone)]
pub enum EmbedderProvider {
    Ollama {
        base_url: String,
        model: String,
        dimensions: usize,
    },
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        dimensions: usize,
    },
    #[cfg(feature = "local-embeddings")]
    FastEmbed,
}

impl EmbedderProvider {
    pub fn create_embedder(&self) -> Result<Box<dyn Embedder>> {
        match self {
            #[cfg(feature = "ollama")]
            EmbedderProvider::Ollama {
                base_url,
                model,
                dimensions,
            } => Ok(Box::new(OllamaEmbedder::new(base_url, model.clone(), *dimensions))),

            #[cfg(not(feature = "ollama"))]
            EmbedderProvider::Ollama { .. } => Err(AppError::Configuration(
                "Ollama embeddings require the `ollama` feature".to_string(),
            )),

            EmbedderProvider::OpenAI {
                api_key,
                api_base,
                model,
                dimensions,
            } => Ok(Box::new(OpenAIEmbedder::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *dimensions,
            )?)),

            #[cfg(feature = "local-embeddings")]
            EmbedderProvider::FastEmbed => Ok(Box::new(FastEmbedder::new()?)),
        }
    }
}

// ============================================================================
// Ollama
// ============================================================================

#[cfg(feature = "ollama")]
pub use self::ollama::OllamaEmbedder;

#[cfg(feature = "ollama")]
mod ollama {
    use super::Embedder;
    use crate::llm::ollama::split_base_url;
    use crate::types::{AppError, Result};
    use async_trait::async_trait;
    use ollama_rs::{
        generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest},
        Ollama,
    };

    /// Embeddings from a local Ollama server (`/api/embed`).
    pub struct OllamaEmbedder {
        client: Ollama,
        model: String,
        dimensions: usize,
    }

    impl OllamaEmbedder {
        pub fn new(base_url: &str, model: String, dimensions: usize) -> Self {
            let (host, port) = split_base_url(base_url);
            Self {
                client: Ollama::new(host, port),
                model,
                dimensions,
            }
        }
    }

    #[async_trait]
    impl Embedder for OllamaEmbedder {
        async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            let request = GenerateEmbeddingsRequest::new(
                self.model.clone(),
                EmbeddingsInput::Multiple(texts.to_vec()),
            );

            let response = self
                .client
                .generate_embeddings(request)
                .await
                .map_err(|e| AppError::Embedding(format!("Ollama error: {}", e)))?;

            Ok(response.embeddings)
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }

        fn model_name(&self) -> &str {
            &self.model
        }
    }
}

// ============================================================================
// OpenAI-compatible
// ============================================================================

/// Embeddings from an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAIEmbedder {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAIEmbedder {
    pub fn new(api_key: String, api_base: String, model: String, dimensions: usize) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .http
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("OpenAI error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "OpenAI API error {}: {}",
                status, body_text
            )));
        }

        let mut parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Invalid OpenAI response: {}", e)))?;

        // The API may return items out of order
        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// fastembed (local ONNX)
// ============================================================================

#[cfg(feature = "local-embeddings")]
pub use self::local::FastEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use super::Embedder;
    use crate::types::{AppError, Result};
    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;
    use std::sync::Arc;

    const BGE_SMALL_DIMENSIONS: usize = 384;

    /// In-process embeddings with BGE-small-en-v1.5.
    pub struct FastEmbedder {
        model: Arc<Mutex<TextEmbedding>>,
    }

    impl FastEmbedder {
        pub fn new() -> Result<Self> {
            let model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(true),
            )
            .map_err(|e| AppError::Embedding(e.to_string()))?;

            Ok(Self {
                model: Arc::new(Mutex::new(model)),
            })
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedder {
        async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let model = Arc::clone(&self.model);
            let texts = texts.to_vec();

            tokio::task::spawn_blocking(move || model.lock().embed(texts, None))
                .await
                .map_err(|e| AppError::Internal(format!("Embedding task failed: {}", e)))?
                .map_err(|e| AppError::Embedding(e.to_string()))
        }

        fn dimensions(&self) -> usize {
            BGE_SMALL_DIMENSIONS
        }

        fn model_name(&self) -> &str {
            "BAAI/bge-small-en-v1.5"
        }
    }
}
