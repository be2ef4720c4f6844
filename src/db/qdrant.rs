use crate::types::{AppError, ChunkMetadata, DocumentChunk, Result, RetrievedChunk};
use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        point_id::PointIdOptions, vectors_config::Config, CreateCollectionBuilder, Distance,
        PointStruct, ScoredPoint, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
    },
    Qdrant,
};
use std::collections::HashMap;

use super::vectorstore::{CollectionStats, EmbeddedChunk, VectorStore};

/// Qdrant vector store implementation.
///
/// Chunk text and metadata travel in the point payload; the chunk id (a UUID)
/// is the point id.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    pub async fn new(url: String, api_key: Option<String>) -> Result<Self> {
        let client = if let Some(key) = api_key {
            Qdrant::from_url(&url)
                .api_key(key)
                .build()
                .map_err(|e| AppError::Database(format!("Failed to create Qdrant client: {}", e)))?
        } else {
            Qdrant::from_url(&url)
                .build()
                .map_err(|e| AppError::Database(format!("Failed to create Qdrant client: {}", e)))?
        };

        Ok(Self { client })
    }

    fn payload_for(chunk: &DocumentChunk) -> HashMap<String, qdrant_client::qdrant::Value> {
        let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
        payload.insert("text".to_string(), chunk.text.clone().into());
        payload.insert("source".to_string(), chunk.metadata.source.clone().into());
        payload.insert(
            "chunk_index".to_string(),
            (chunk.metadata.chunk_index as i64).into(),
        );
        payload.insert("upload_time".to_string(), chunk.metadata.upload_time.into());
        payload
    }

    /// Rebuild a chunk from a scored point; points missing payload fields are skipped.
    fn parse_scored_point(point: ScoredPoint) -> Option<RetrievedChunk> {
        let payload = point.payload;
        let text = payload.get("text")?.as_str()?.to_string();
        let source = payload.get("source")?.as_str()?.to_string();
        let chunk_index = usize::try_from(payload.get("chunk_index")?.as_integer()?).ok()?;
        let upload_time = payload.get("upload_time")?.as_integer()?;

        let id = match point.id?.point_id_options? {
            PointIdOptions::Num(num) => num.to_string(),
            PointIdOptions::Uuid(uuid) => uuid,
        };

        Some(RetrievedChunk {
            chunk: DocumentChunk {
                id,
                text,
                metadata: ChunkMetadata {
                    source,
                    chunk_index,
                    upload_time,
                },
            },
            score: point.score,
        })
    }
}

// ============================================================================
// VectorStore Trait Implementation
// ============================================================================

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn provider_name(&self) -> &'static str {
        "qdrant"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(
                VectorParamsBuilder::new(dimensions as u64, Distance::Cosine),
            ))
            .await
            .map_err(|e| AppError::Database(format!("Failed to create collection: {}", e)))?;

        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| AppError::Database(format!("Failed to list collections: {}", e)))?;

        Ok(collections.collections.iter().any(|c| c.name == name))
    }

    async fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        let info = self
            .client
            .collection_info(name)
            .await
            .map_err(|e| AppError::Database(format!("Failed to get collection info: {}", e)))?;

        let result = info
            .result
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", name)))?;

        let document_count = result.points_count.unwrap_or(0) as usize;
        let dimensions = result
            .config
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| match v.config {
                Some(Config::Params(p)) => Some(p.size as usize),
                _ => None,
            })
            .unwrap_or(0);

        Ok(CollectionStats {
            name: name.to_string(),
            document_count,
            dimensions,
            distance_metric: "cosine".to_string(),
        })
    }

    async fn upsert(&self, collection: &str, chunks: &[EmbeddedChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let points: Vec<PointStruct> = chunks
            .iter()
            .map(|entry| {
                PointStruct::new(
                    entry.chunk.id.clone(),
                    entry.embedding.clone(),
                    Self::payload_for(&entry.chunk),
                )
            })
            .collect();

        let count = points.len();
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| AppError::Database(format!("Failed to upsert points: {}", e)))?;

        Ok(count)
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<RetrievedChunk>> {
        let search_builder = SearchPointsBuilder::new(collection, embedding.to_vec(), limit as u64)
            .score_threshold(threshold)
            .with_payload(true);

        let search_result = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| AppError::Database(format!("Failed to search: {}", e)))?;

        Ok(search_result
            .result
            .into_iter()
            .filter_map(Self::parse_scored_point)
            .collect())
    }
}
