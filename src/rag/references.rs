//! Citation strings for retrieved chunks.

use crate::types::{ChunkMetadata, RetrievedChunk};

/// Format one citation: `"<source> (片段 <n>)"` with a 1-based chunk number.
pub fn format_reference(metadata: &ChunkMetadata) -> String {
    format!("{} (片段 {})", metadata.source, metadata.chunk_index + 1)
}

/// One citation per retrieved chunk, in retrieval order, duplicates kept.
pub fn build_references(chunks: &[RetrievedChunk]) -> Vec<String> {
    chunks
        .iter()
        .map(|retrieved| format_reference(&retrieved.chunk.metadata))
        .collect()
}
