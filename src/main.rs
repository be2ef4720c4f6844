use anyhow::Context;
use clap::Parser;
use knowbase::{
    api::routes,
    rag::{
        chunker::TokenChunker, reader::ExtractingReader, store::EmbeddingStore, ChatService,
        DocumentService,
    },
    utils::{KnowbaseConfig, LogFormat},
    AppState,
};
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// KnowBase - a minimal RAG knowledge base server
#[derive(Parser, Debug)]
#[command(
    name = "knowbase-server",
    version,
    about = "Upload documents and ask questions answered from them",
    after_help = "EXAMPLES:\n    \
                  knowbase-server                    # Start with ./knowbase.toml (or defaults)\n    \
                  knowbase-server --config my.toml   # Use a custom config file"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "KNOWBASE_CONFIG", default_value = "knowbase.toml")]
    config: PathBuf,
}

fn init_tracing(config: &KnowbaseConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let (text, json) = match config.server.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = KnowbaseConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    init_tracing(&config);

    tracing::info!(config = %cli.config.display(), "Starting KnowBase");

    let provider = config.llm.to_provider()?;
    let llm = provider
        .create_client()
        .await
        .context("Failed to create LLM client")?;
    tracing::info!(provider = provider.name(), model = provider.model(), "LLM ready");

    let embedder = config
        .embedding
        .to_provider()?
        .create_embedder()
        .context("Failed to create embedder")?;
    tracing::info!(
        model = embedder.model_name(),
        dimensions = embedder.dimensions(),
        "Embedder ready"
    );

    let vectors = config
        .vector_store
        .to_provider()?
        .create_store()
        .await
        .context("Failed to connect to vector store")?;

    let store = Arc::new(EmbeddingStore::new(
        Arc::from(embedder),
        Arc::from(vectors),
        config.vector_store.collection.clone(),
    ));

    let created = store
        .ensure_collection()
        .await
        .context("Failed to prepare vector collection")?;
    tracing::info!(
        store = store.vectors().provider_name(),
        collection = store.collection(),
        created,
        "Vector collection ready"
    );

    let document_service = DocumentService::new(
        Arc::new(ExtractingReader::new()),
        Arc::new(TokenChunker::new()?),
        store.clone(),
    );
    let chat_service = ChatService::new(store, Arc::from(llm));

    let bind_address = config.bind_address();
    let state = AppState {
        config: Arc::new(config),
        chat_service: Arc::new(chat_service),
        document_service: Arc::new(document_service),
    };

    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Server listening on http://{}", bind_address);
    #[cfg(feature = "swagger-ui")]
    tracing::info!("API documentation: http://{}/swagger-ui/", bind_address);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
