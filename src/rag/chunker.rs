//! Token-based text chunking.
//!
//! Splitting is delegated to `text-splitter`, sized in `cl100k_base` tokens.
//! This module only applies the policy around it: the minimum embeddable
//! length and the cap on chunks per upload.

use crate::types::{AppError, RawDocument, Result};
use text_splitter::{ChunkConfig, TextSplitter};
use tiktoken_rs::CoreBPE;

/// Fixed parameters for splitting an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPolicy {
    /// Maximum chunk size in tokens
    pub chunk_size: usize,
    /// Tokens shared between neighbouring chunks
    pub overlap: usize,
    /// Chunks with fewer trimmed characters are discarded
    pub min_chunk_len: usize,
    /// Hard cap on chunks produced per call
    pub max_chunks: usize,
    /// Keep separators and surrounding whitespace in chunk text
    pub keep_separator: bool,
}

impl ChunkPolicy {
    /// The policy every upload is split with.
    pub const UPLOAD: ChunkPolicy = ChunkPolicy {
        chunk_size: 5000,
        overlap: 100,
        min_chunk_len: 5,
        max_chunks: 10_000,
        keep_separator: true,
    };
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self::UPLOAD
    }
}

/// Splits raw documents into ordered chunk texts.
pub trait TextChunker: Send + Sync {
    /// Chunks of all `documents`, in document order then split order.
    fn split(&self, documents: &[RawDocument], policy: &ChunkPolicy) -> Result<Vec<String>>;
}

/// [`TextChunker`] counting tokens with the `cl100k_base` encoding.
pub struct TokenChunker {
    tokenizer: CoreBPE,
}

impl TokenChunker {
    pub fn new() -> Result<Self> {
        let tokenizer = tiktoken_rs::cl100k_base()
            .map_err(|e| AppError::Internal(format!("Failed to load tokenizer: {}", e)))?;
        Ok(Self { tokenizer })
    }
}

impl TextChunker for TokenChunker {
    fn split(&self, documents: &[RawDocument], policy: &ChunkPolicy) -> Result<Vec<String>> {
        let config = ChunkConfig::new(policy.chunk_size)
            .with_sizer(&self.tokenizer)
            .with_overlap(policy.overlap)
            .map_err(|e| AppError::InvalidInput(format!("Invalid chunk policy: {}", e)))?
            .with_trim(!policy.keep_separator);
        let splitter = TextSplitter::new(config);

        let chunks = documents
            .iter()
            .flat_map(|doc| splitter.chunks(&doc.text))
            .filter(|chunk| chunk.trim().chars().count() >= policy.min_chunk_len)
            .take(policy.max_chunks)
            .map(str::to_string)
            .collect();

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker() -> TokenChunker {
        TokenChunker::new().expect("cl100k_base is bundled")
    }

    #[test]
    fn test_short_document_is_single_chunk() {
        let docs = vec![RawDocument::new("Rust 是一门系统编程语言。")];
        let chunks = chunker().split(&docs, &ChunkPolicy::UPLOAD).unwrap();

        assert_eq!(chunks, vec!["Rust 是一门系统编程语言。".to_string()]);
    }

    #[test]
    fn test_long_document_splits_under_capacity() {
        let paragraph = "Ownership rules govern how memory is managed in Rust programs. ";
        let docs = vec![RawDocument::new(paragraph.repeat(200))];
        let policy = ChunkPolicy {
            chunk_size: 100,
            overlap: 10,
            ..ChunkPolicy::UPLOAD
        };

        let c = chunker();
        let chunks = c.split(&docs, &policy).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(c.tokenizer.encode_ordinary(chunk).len() <= 100);
        }
    }

    #[test]
    fn test_tiny_chunks_are_dropped() {
        let docs = vec![RawDocument::new("ok"), RawDocument::new("long enough text")];
        let chunks = chunker().split(&docs, &ChunkPolicy::UPLOAD).unwrap();

        assert_eq!(chunks, vec!["long enough text".to_string()]);
    }

    #[test]
    fn test_chunk_cap_is_applied() {
        let docs: Vec<RawDocument> = (0..10)
            .map(|i| RawDocument::new(format!("document number {}", i)))
            .collect();
        let policy = ChunkPolicy {
            max_chunks: 4,
            ..ChunkPolicy::UPLOAD
        };

        let chunks = chunker().split(&docs, &policy).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], "document number 0");
        assert_eq!(chunks[3], "document number 3");
    }

    #[test]
    fn test_overlap_must_be_below_capacity() {
        let policy = ChunkPolicy {
            chunk_size: 10,
            overlap: 20,
            ..ChunkPolicy::UPLOAD
        };
        let result = chunker().split(&[RawDocument::new("text")], &policy);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_documents_no_chunks() {
        assert!(chunker().split(&[], &ChunkPolicy::UPLOAD).unwrap().is_empty());
    }
}
