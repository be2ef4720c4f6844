//! TOML-based configuration for KnowBase
//!
//! The server reads a single `knowbase.toml` describing where it listens and
//! which collaborators it talks to: the chat model, the embedding model and the
//! vector store. Every section has defaults, so an empty file (or no file at
//! all) yields a local setup: Ollama on `localhost:11434` and an in-memory
//! vector store.
//!
//! Secrets are never written into the file. Providers reference them by the
//! name of an environment variable, resolved at startup.
//!
//! Retrieval, generation and chunking parameters are compile-time constants in
//! [`crate::rag`] and deliberately absent here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::db::VectorStoreProvider;
use crate::llm::Provider;
use crate::rag::embeddings::EmbedderProvider;

/// Root configuration structure loaded from knowbase.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowbaseConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat completion provider
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding provider
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Fallback filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Path prefix every endpoint is mounted under
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            api_prefix: default_api_prefix(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_chat_model")]
        model: String,
    },
    OpenAI {
        /// Environment variable containing API key
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        #[serde(default = "default_openai_chat_model")]
        model: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_chat_model() -> String {
    "llama3.2".to_string()
}

fn default_openai_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig::Ollama {
            base_url: default_ollama_url(),
            model: default_chat_model(),
        }
    }
}

impl LlmConfig {
    /// Turn the configured section into a client provider, resolving secrets.
    pub fn to_provider(&self) -> Result<Provider, ConfigError> {
        match self {
            LlmConfig::Ollama { base_url, model } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
            }),
            LlmConfig::OpenAI {
                api_key_env,
                api_base,
                model,
            } => Ok(Provider::OpenAI {
                api_key: resolve_required_env(api_key_env)?,
                api_base: api_base.clone(),
                model: model.clone(),
            }),
        }
    }
}

// ============= Embedding Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum EmbeddingConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_embedding_model")]
        model: String,
        #[serde(default = "default_ollama_dimensions")]
        dimensions: usize,
    },
    OpenAI {
        #[serde(default = "default_openai_key_env")]
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        #[serde(default = "default_openai_embedding_model")]
        model: String,
        #[serde(default = "default_openai_dimensions")]
        dimensions: usize,
    },
    /// Local ONNX models through fastembed (BGE-small, 384 dimensions)
    #[cfg(feature = "local-embeddings")]
    FastEmbed,
}

fn default_ollama_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_ollama_dimensions() -> usize {
    768
}

fn default_openai_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_openai_dimensions() -> usize {
    1536
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig::Ollama {
            base_url: default_ollama_url(),
            model: default_ollama_embedding_model(),
            dimensions: default_ollama_dimensions(),
        }
    }
}

impl EmbeddingConfig {
    pub fn to_provider(&self) -> Result<EmbedderProvider, ConfigError> {
        match self {
            EmbeddingConfig::Ollama {
                base_url,
                model,
                dimensions,
            } => Ok(EmbedderProvider::Ollama {
                base_url: base_url.clone(),
                model: model.clone(),
                dimensions: *dimensions,
            }),
            EmbeddingConfig::OpenAI {
                api_key_env,
                api_base,
                model,
                dimensions,
            } => Ok(EmbedderProvider::OpenAI {
                api_key: resolve_required_env(api_key_env)?,
                api_base: api_base.clone(),
                model: model.clone(),
                dimensions: *dimensions,
            }),
            #[cfg(feature = "local-embeddings")]
            EmbeddingConfig::FastEmbed => Ok(EmbedderProvider::FastEmbed),
        }
    }
}

// ============= Vector Store Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreKind {
    #[default]
    Memory,
    Qdrant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub provider: VectorStoreKind,

    /// Qdrant gRPC endpoint
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    /// Environment variable for the Qdrant API key
    pub api_key_env: Option<String>,

    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".to_string()
}

fn default_collection() -> String {
    "knowbase".to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: VectorStoreKind::default(),
            url: default_qdrant_url(),
            api_key_env: None,
            collection: default_collection(),
        }
    }
}

impl VectorStoreConfig {
    pub fn to_provider(&self) -> Result<VectorStoreProvider, ConfigError> {
        match self.provider {
            VectorStoreKind::Memory => Ok(VectorStoreProvider::InMemory),
            #[cfg(feature = "qdrant")]
            VectorStoreKind::Qdrant => {
                let api_key = match self.api_key_env {
                    Some(ref env) => Some(resolve_required_env(env)?),
                    None => None,
                };
                Ok(VectorStoreProvider::Qdrant {
                    url: self.url.clone(),
                    api_key,
                })
            }
            #[cfg(not(feature = "qdrant"))]
            VectorStoreKind::Qdrant => Err(ConfigError::ValidationError(
                "vector_store.provider = \"qdrant\" requires the `qdrant` feature".to_string(),
            )),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl KnowbaseConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::FileNotFound(missing)) => {
                info!(path = %missing.display(), "No configuration file, using defaults");
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: KnowbaseConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host must not be empty".to_string(),
            ));
        }

        if !self.server.api_prefix.is_empty() && !self.server.api_prefix.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "server.api_prefix must start with '/', got '{}'",
                self.server.api_prefix
            )));
        }

        if self.server.api_prefix.ends_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "server.api_prefix must not end with '/', got '{}'",
                self.server.api_prefix
            )));
        }

        if self.vector_store.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "vector_store.collection must not be empty".to_string(),
            ));
        }

        match &self.llm {
            LlmConfig::Ollama { model, .. } | LlmConfig::OpenAI { model, .. }
                if model.trim().is_empty() =>
            {
                return Err(ConfigError::ValidationError(
                    "llm.model must not be empty".to_string(),
                ));
            }
            LlmConfig::OpenAI { api_key_env, .. } => self.validate_env_var(api_key_env)?,
            LlmConfig::Ollama { .. } => {}
        }

        match &self.embedding {
            EmbeddingConfig::Ollama { dimensions, .. }
            | EmbeddingConfig::OpenAI { dimensions, .. }
                if *dimensions == 0 =>
            {
                return Err(ConfigError::ValidationError(
                    "embedding.dimensions must be greater than zero".to_string(),
                ));
            }
            EmbeddingConfig::OpenAI { api_key_env, .. } => self.validate_env_var(api_key_env)?,
            _ => {}
        }

        if let Some(ref env) = self.vector_store.api_key_env {
            self.validate_env_var(env)?;
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn resolve_required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}
