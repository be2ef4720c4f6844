//! Vector Store Abstraction Layer
//!
//! Raw vector persistence behind a common trait. The store knows nothing about
//! embedding models: callers hand it chunks that already carry vectors, and
//! query it with a vector.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   VectorStore Trait                  │
//! ├──────────────────────────────────────────────────────┤
//! │ create_collection │ upsert │ search │ collection_stats│
//! └──────────────────────────────────────────────────────┘
//!            ▲                          ▲
//!      ┌─────┴─────┐              ┌─────┴────┐
//!      │ In-memory │              │  Qdrant  │
//!      │ (default) │              │ (feature)│
//!      └───────────┘              └──────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use knowbase::db::{VectorStore, VectorStoreProvider};
//!
//! let store = VectorStoreProvider::InMemory.create_store().await?;
//! store.create_collection("knowbase", 768).await?;
//! store.upsert("knowbase", &embedded_chunks).await?;
//! let hits = store.search("knowbase", &query_embedding, 3, 0.6).await?;
//! ```

use crate::types::{AppError, DocumentChunk, Result, RetrievedChunk};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Vector Store Provider Configuration
// ============================================================================

/// Configuration for vector store providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// Qdrant - High-performance vector search engine.
    ///
    /// Requires a running Qdrant server.
    #[cfg(feature = "qdrant")]
    Qdrant {
        /// Qdrant server URL (e.g., "http://localhost:6334").
        url: String,
        /// Optional API key for authentication.
        api_key: Option<String>,
    },

    /// In-memory vector store.
    ///
    /// Data is not persisted and will be lost when the process exits.
    InMemory,
}

impl VectorStoreProvider {
    /// Create a vector store instance from this provider configuration.
    pub async fn create_store(&self) -> Result<Box<dyn VectorStore>> {
        match self {
            #[cfg(feature = "qdrant")]
            VectorStoreProvider::Qdrant { url, api_key } => {
                let store =
                    super::qdrant::QdrantVectorStore::new(url.clone(), api_key.clone()).await?;
                Ok(Box::new(store))
            }

            VectorStoreProvider::InMemory => Ok(Box::new(InMemoryVectorStore::new())),
        }
    }
}

// ============================================================================
// Stored Types
// ============================================================================

/// A chunk paired with its embedding, ready to be persisted.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

/// Statistics about a vector collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Name of the collection.
    pub name: String,
    /// Number of chunks in the collection.
    pub document_count: usize,
    /// Dimensionality of vectors in the collection.
    pub dimensions: usize,
    /// Distance metric used.
    pub distance_metric: String,
}

// ============================================================================
// Vector Store Trait
// ============================================================================

/// Abstract trait for vector database operations.
///
/// # Implementors
///
/// - `InMemoryVectorStore` - brute-force cosine search, no persistence
/// - `QdrantVectorStore` - Qdrant server (feature `qdrant`)
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this vector store provider.
    fn provider_name(&self) -> &'static str;

    /// Create a new collection with the specified vector dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection already exists or creation fails.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Check if a collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Get statistics about a collection.
    async fn collection_stats(&self, name: &str) -> Result<CollectionStats>;

    /// Upsert chunks with their embeddings into a collection.
    ///
    /// Chunks are identified by their `id`; an existing id is overwritten.
    /// Returns the number of chunks written.
    async fn upsert(&self, collection: &str, chunks: &[EmbeddedChunk]) -> Result<usize>;

    /// Search for similar vectors in a collection.
    ///
    /// # Arguments
    ///
    /// * `collection` - Name of the collection to search.
    /// * `embedding` - Query vector.
    /// * `limit` - Maximum number of results to return.
    /// * `threshold` - Minimum cosine similarity a result must reach.
    ///
    /// # Returns
    ///
    /// At most `limit` results, sorted by similarity score (descending).
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievedChunk>>;

    /// Count chunks in a collection.
    async fn count(&self, collection: &str) -> Result<usize> {
        let stats = self.collection_stats(collection).await?;
        Ok(stats.document_count)
    }

    /// Create the collection unless it already exists.
    ///
    /// Returns `true` when a new collection was created.
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<bool> {
        if self.collection_exists(name).await? {
            return Ok(false);
        }
        self.create_collection(name, dimensions).await?;
        Ok(true)
    }
}

// ============================================================================
// In-Memory Vector Store
// ============================================================================

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory vector store.
///
/// Data is not persisted and will be lost when the process exits.
/// Uses cosine similarity for vector comparisons.
pub struct InMemoryVectorStore {
    collections: Arc<RwLock<HashMap<String, InMemoryCollection>>>,
}

struct InMemoryCollection {
    dimensions: usize,
    /// Insertion order is kept so equal scores rank stably.
    entries: Vec<EmbeddedChunk>,
    positions: HashMap<String, usize>,
}

impl InMemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Calculate cosine similarity between two vectors.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(AppError::InvalidInput(format!(
                "Collection '{}' already exists",
                name
            )));
        }
        collections.insert(
            name.to_string(),
            InMemoryCollection {
                dimensions,
                entries: Vec::new(),
                positions: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let collections = self.collections.read();
        Ok(collections.contains_key(name))
    }

    async fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        let collections = self.collections.read();
        let col = collections
            .get(name)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", name)))?;

        Ok(CollectionStats {
            name: name.to_string(),
            document_count: col.entries.len(),
            dimensions: col.dimensions,
            distance_metric: "cosine".to_string(),
        })
    }

    async fn upsert(&self, collection: &str, chunks: &[EmbeddedChunk]) -> Result<usize> {
        let mut collections = self.collections.write();
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", collection)))?;

        for entry in chunks {
            if entry.embedding.len() != col.dimensions {
                return Err(AppError::InvalidInput(format!(
                    "Chunk '{}' has {} dimensions, collection '{}' expects {}",
                    entry.chunk.id,
                    entry.embedding.len(),
                    collection,
                    col.dimensions
                )));
            }
        }

        for entry in chunks {
            match col.positions.get(&entry.chunk.id) {
                Some(&pos) => col.entries[pos] = entry.clone(),
                None => {
                    col.positions
                        .insert(entry.chunk.id.clone(), col.entries.len());
                    col.entries.push(entry.clone());
                }
            }
        }

        Ok(chunks.len())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievedChunk>> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", collection)))?;

        let mut results: Vec<RetrievedChunk> = col
            .entries
            .iter()
            .filter_map(|entry| {
                let score = Self::cosine_similarity(embedding, &entry.embedding);
                (score >= threshold).then(|| RetrievedChunk {
                    chunk: entry.chunk.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }
}

// ============================================================================
// Tests
// ============================================================================
