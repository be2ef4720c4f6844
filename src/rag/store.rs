//! Text-level knowledge store.
//!
//! [`KnowledgeStore`] is what the orchestrators talk to: chunks go in as text,
//! questions come back as ranked chunks. [`EmbeddingStore`] implements it by
//! pairing an [`Embedder`] with a [`VectorStore`] collection.

use crate::db::{EmbeddedChunk, VectorStore};
use crate::rag::embeddings::Embedder;
use crate::types::{AppError, DocumentChunk, Result, RetrievedChunk};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Texts sent to the embedder per request. 32 chunks of the largest upload
/// chunk size stay under hosted embedding endpoints' per-request token limits.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 32;

/// Similarity-searchable chunk storage.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Persist chunks in one batch; they are searchable once this returns.
    async fn add(&self, chunks: Vec<DocumentChunk>) -> Result<usize>;

    /// At most `top_k` chunks scoring at least `threshold`, best first.
    async fn similarity_search(
        &self,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievedChunk>>;
}

/// [`KnowledgeStore`] backed by an embedding model and a vector store.
pub struct EmbeddingStore {
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorStore>,
    collection: String,
    batch_size: usize,
}

impl EmbeddingStore {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            vectors,
            collection: collection.into(),
            batch_size: DEFAULT_EMBED_BATCH_SIZE,
        }
    }

    /// Override the number of texts embedded per request (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Create the backing collection with the embedder's dimensionality if absent.
    pub async fn ensure_collection(&self) -> Result<bool> {
        self.vectors
            .ensure_collection(&self.collection, self.embedder.dimensions())
            .await
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn vectors(&self) -> &Arc<dyn VectorStore> {
        &self.vectors
    }
}

#[async_trait]
impl KnowledgeStore for EmbeddingStore {
    async fn add(&self, chunks: Vec<DocumentChunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        // Everything is embedded before the single upsert, so a failing batch
        // stores nothing.
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embedder.embed_texts(batch).await?);
        }

        if embeddings.len() != chunks.len() {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
            .collect();

        let stored = self.vectors.upsert(&self.collection, &entries).await?;
        debug!(collection = %self.collection, stored, "Stored chunks");
        Ok(stored)
    }

    async fn similarity_search(
        &self,
        query: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievedChunk>> {
        let embedding = self.embedder.embed_query(query).await?;
        self.vectors
            .search(&self.collection, &embedding, top_k, threshold)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryVectorStore;
    use crate::types::ChunkMetadata;

    /// Maps text onto fixed axes by keyword so similarity is predictable.
    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    vec![
                        if t.contains("rust") { 1.0 } else { 0.0 },
                        if t.contains("python") { 1.0 } else { 0.0 },
                        0.01,
                    ]
                })
                .collect())
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "axis"
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed_texts(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![])
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "short"
        }
    }

    fn chunk(text: &str, index: usize) -> DocumentChunk {
        DocumentChunk {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            metadata: ChunkMetadata {
                source: "langs.txt".to_string(),
                chunk_index: index,
                upload_time: 0,
            },
        }
    }

    async fn store_with(embedder: Arc<dyn Embedder>) -> EmbeddingStore {
        let store = EmbeddingStore::new(embedder, Arc::new(InMemoryVectorStore::new()), "test");
        assert!(store.ensure_collection().await.unwrap());
        store
    }

    #[tokio::test]
    async fn test_add_then_search() {
        let store = store_with(Arc::new(AxisEmbedder)).await;

        let added = store
            .add(vec![chunk("rust ownership", 0), chunk("python decorators", 1)])
            .await
            .unwrap();
        assert_eq!(added, 2);

        let hits = store.similarity_search("rust?", 3, 0.6).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.text, "rust ownership");
    }

    #[tokio::test]
    async fn test_unrelated_query_returns_nothing() {
        let store = store_with(Arc::new(AxisEmbedder)).await;
        store.add(vec![chunk("rust ownership", 0)]).await.unwrap();

        let hits = store.similarity_search("weather today", 3, 0.6).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_add_empty_is_noop() {
        let store = store_with(Arc::new(AxisEmbedder)).await;
        assert_eq!(store.add(vec![]).await.unwrap(), 0);
        assert_eq!(store.vectors().count(store.collection()).await.unwrap(), 0);
    }

    /// Rejects requests larger than its limit, like hosted embedding APIs.
    struct LimitedEmbedder {
        limit: usize,
        fail_on_call: Option<usize>,
        calls: parking_lot::Mutex<Vec<usize>>,
    }

    impl LimitedEmbedder {
        fn new(limit: usize) -> Self {
            Self {
                limit,
                fail_on_call: None,
                calls: parking_lot::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Embedder for LimitedEmbedder {
        async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let call = {
                let mut calls = self.calls.lock();
                calls.push(texts.len());
                calls.len()
            };
            if texts.len() > self.limit {
                return Err(AppError::Embedding("too many inputs".into()));
            }
            if self.fail_on_call == Some(call) {
                return Err(AppError::Embedding("upstream unavailable".into()));
            }
            AxisEmbedder.embed_texts(texts).await
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "limited"
        }
    }

    #[tokio::test]
    async fn test_large_add_is_embedded_in_batches() {
        let embedder = Arc::new(LimitedEmbedder::new(4));
        let store = store_with(embedder.clone()).await.with_batch_size(4);

        let chunks: Vec<DocumentChunk> = (0..10)
            .map(|i| chunk(&format!("rust chunk {}", i), i))
            .collect();
        let added = store.add(chunks).await.unwrap();

        assert_eq!(added, 10);
        assert_eq!(*embedder.calls.lock(), vec![4, 4, 2]);
        assert_eq!(store.vectors().count(store.collection()).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_default_batch_size_bounds_requests() {
        let embedder = Arc::new(LimitedEmbedder::new(DEFAULT_EMBED_BATCH_SIZE));
        let store = store_with(embedder.clone()).await;

        let chunks: Vec<DocumentChunk> = (0..DEFAULT_EMBED_BATCH_SIZE * 2 + 1)
            .map(|i| chunk("rust", i))
            .collect();
        store.add(chunks).await.unwrap();

        let calls = embedder.calls.lock();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|n| *n <= DEFAULT_EMBED_BATCH_SIZE));
    }

    #[tokio::test]
    async fn test_failed_batch_stores_nothing() {
        let embedder = Arc::new(LimitedEmbedder {
            fail_on_call: Some(2),
            ..LimitedEmbedder::new(4)
        });
        let store = store_with(embedder).await.with_batch_size(4);

        let chunks: Vec<DocumentChunk> = (0..10).map(|i| chunk("rust", i)).collect();
        let result = store.add(chunks).await;

        assert!(matches!(result, Err(AppError::Embedding(_))));
        assert_eq!(store.vectors().count(store.collection()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_embedding_count_mismatch_is_error() {
        let store = store_with(Arc::new(ShortEmbedder)).await;
        let result = store.add(vec![chunk("rust", 0)]).await;
        assert!(matches!(result, Err(AppError::Embedding(_))));
    }
}
