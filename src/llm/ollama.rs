use crate::llm::client::{llm_error, GenerationParams, LLMClient};
use crate::types::Result;
use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    models::ModelOptions,
    Ollama,
};

const DEFAULT_OLLAMA_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let (host, port) = split_base_url(&base_url);
        let client = Ollama::new(host, port);

        Ok(Self { client, model })
    }
}

/// Split `scheme://host:port` into the `(scheme://host, port)` pair `ollama-rs` expects.
///
/// Missing scheme defaults to `http`, missing or unparsable port to 11434.
pub(crate) fn split_base_url(base_url: &str) -> (String, u16) {
    let trimmed = base_url.trim_end_matches('/');
    let (scheme, rest) = match trimmed.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", trimmed),
    };

    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().unwrap_or(DEFAULT_OLLAMA_PORT)),
        None => (rest, DEFAULT_OLLAMA_PORT),
    };

    let host = if host.is_empty() { "localhost" } else { host };
    (format!("{}://{}", scheme, host), port)
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let messages = vec![ChatMessage::user(prompt.to_string())];

        let options = ModelOptions::default()
            .temperature(params.temperature)
            .num_predict(params.max_tokens as i32);

        let request = ChatMessageRequest::new(self.model.clone(), messages).options(options);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| llm_error("Ollama", e))?;

        Ok(response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:11434", "http://localhost", 11434)]
    #[case("http://localhost", "http://localhost", 11434)]
    #[case("http://192.168.1.100:8080", "http://192.168.1.100", 8080)]
    #[case("https://ollama.internal:443/", "https://ollama.internal", 443)]
    #[case("ollama:11434", "http://ollama", 11434)]
    fn test_split_base_url(#[case] input: &str, #[case] host: &str, #[case] port: u16) {
        assert_eq!(split_base_url(input), (host.to_string(), port));
    }

    #[tokio::test]
    async fn test_client_keeps_model_name() {
        let client = OllamaClient::new("http://localhost:11434".to_string(), "qwen2.5".to_string())
            .await
            .unwrap();
        assert_eq!(client.model_name(), "qwen2.5");
    }
}
