//! Document ingestion: read, split, tag, store.

use crate::rag::chunker::{ChunkPolicy, TextChunker};
use crate::rag::reader::DocumentReader;
use crate::rag::store::KnowledgeStore;
use crate::types::{now_millis, ChunkMetadata, DocumentChunk, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of one upload. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Stored { filename: String, chunks: usize },
    Failed { reason: String },
}

impl IngestOutcome {
    /// The user-facing message for this outcome.
    pub fn message(&self) -> String {
        match self {
            IngestOutcome::Stored { filename, chunks } => {
                format!("文档 '{}' 上传成功，共处理 {} 个文档块", filename, chunks)
            }
            IngestOutcome::Failed { reason } => format!("文档上传失败: {}", reason),
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, IngestOutcome::Stored { .. })
    }
}

/// Turns uploaded files into stored, tagged chunks.
pub struct DocumentService {
    reader: Arc<dyn DocumentReader>,
    chunker: Arc<dyn TextChunker>,
    store: Arc<dyn KnowledgeStore>,
    policy: ChunkPolicy,
}

impl DocumentService {
    pub fn new(
        reader: Arc<dyn DocumentReader>,
        chunker: Arc<dyn TextChunker>,
        store: Arc<dyn KnowledgeStore>,
    ) -> Self {
        Self {
            reader,
            chunker,
            store,
            policy: ChunkPolicy::UPLOAD,
        }
    }

    /// Ingest one file. Never fails; problems become [`IngestOutcome::Failed`].
    pub async fn upload(&self, bytes: &[u8], filename: &str) -> IngestOutcome {
        let start = Instant::now();

        match self.ingest(bytes, filename).await {
            Ok(chunks) => {
                info!(
                    filename = %filename,
                    bytes = bytes.len(),
                    chunks,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Document ingested"
                );
                IngestOutcome::Stored {
                    filename: filename.to_string(),
                    chunks,
                }
            }
            Err(e) => {
                warn!(filename = %filename, error = %e, "Document ingestion failed");
                IngestOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn ingest(&self, bytes: &[u8], filename: &str) -> Result<usize> {
        let documents = self.reader.read(bytes, filename)?;
        let texts = self.chunker.split(&documents, &self.policy)?;
        let chunks = tag_chunks(texts, filename, now_millis());
        let count = chunks.len();

        self.store.add(chunks).await?;
        Ok(count)
    }
}

/// Attach source metadata; indices follow split order starting at zero.
fn tag_chunks(texts: Vec<String>, filename: &str, upload_time: i64) -> Vec<DocumentChunk> {
    texts
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| DocumentChunk {
            id: Uuid::new_v4().to_string(),
            text,
            metadata: ChunkMetadata {
                source: filename.to_string(),
                chunk_index,
                upload_time,
            },
        })
        .collect()
}
