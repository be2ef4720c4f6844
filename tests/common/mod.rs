#![allow(dead_code)]

pub mod mocks;

use axum::Router;
use knowbase::{
    api::routes,
    db::InMemoryVectorStore,
    rag::{
        chunker::TokenChunker, reader::ExtractingReader, store::EmbeddingStore, ChatService,
        DocumentService,
    },
    AppState, KnowbaseConfig,
};
use mocks::{KeywordEmbedder, MockLLMClient};
use std::sync::Arc;

/// Real pipelines over mock models and an in-memory store.
pub async fn test_state(config: KnowbaseConfig, llm: MockLLMClient) -> AppState {
    let store = Arc::new(EmbeddingStore::new(
        Arc::new(KeywordEmbedder::default()),
        Arc::new(InMemoryVectorStore::new()),
        config.vector_store.collection.clone(),
    ));
    store
        .ensure_collection()
        .await
        .expect("Failed to create test collection");

    let document_service = DocumentService::new(
        Arc::new(ExtractingReader::new()),
        Arc::new(TokenChunker::new().expect("Failed to load tokenizer")),
        store.clone(),
    );
    let chat_service = ChatService::new(store, Arc::new(llm));

    AppState {
        config: Arc::new(config),
        chat_service: Arc::new(chat_service),
        document_service: Arc::new(document_service),
    }
}

pub async fn test_app(llm: MockLLMClient) -> Router {
    routes::app(test_state(KnowbaseConfig::default(), llm).await)
}
