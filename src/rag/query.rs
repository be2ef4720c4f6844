//! Question answering over the knowledge store.

use crate::llm::{GenerationParams, LLMClient};
use crate::rag::prompt::{build_prompt, join_context};
use crate::rag::references::build_references;
use crate::rag::store::KnowledgeStore;
use crate::rag::{MAX_TOKENS, SIMILARITY_THRESHOLD, TEMPERATURE, TOP_K};
use crate::types::{ChatResponse, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Answer returned when retrieval finds nothing usable.
pub const NO_CONTEXT_ANSWER: &str =
    "抱歉，我没有找到相关的文档信息来回答您的问题。请先上传相关文档。";

/// Result of one question. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Generated from retrieved context.
    Answered {
        answer: String,
        references: Vec<String>,
    },
    /// Nothing relevant was retrieved; generation was skipped.
    NoContext,
    Failed { reason: String },
}

impl QueryOutcome {
    pub fn answer(&self) -> String {
        match self {
            QueryOutcome::Answered { answer, .. } => answer.clone(),
            QueryOutcome::NoContext => NO_CONTEXT_ANSWER.to_string(),
            QueryOutcome::Failed { reason } => format!("处理您的问题时出现错误: {}", reason),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            QueryOutcome::Answered { .. } => "answered",
            QueryOutcome::NoContext => "no_context",
            QueryOutcome::Failed { .. } => "failed",
        }
    }
}

impl From<QueryOutcome> for ChatResponse {
    fn from(outcome: QueryOutcome) -> Self {
        let answer = outcome.answer();
        let references = match outcome {
            QueryOutcome::Answered { references, .. } => references,
            QueryOutcome::NoContext | QueryOutcome::Failed { .. } => Vec::new(),
        };
        ChatResponse::new(answer, references)
    }
}

/// Retrieves context for a question and asks the chat model about it.
pub struct ChatService {
    store: Arc<dyn KnowledgeStore>,
    llm: Arc<dyn LLMClient>,
}

impl ChatService {
    pub fn new(store: Arc<dyn KnowledgeStore>, llm: Arc<dyn LLMClient>) -> Self {
        Self { store, llm }
    }

    /// Answer one question. Never fails; problems become [`QueryOutcome::Failed`].
    pub async fn answer(&self, question: &str) -> QueryOutcome {
        let start = Instant::now();

        let outcome = match self.answer_inner(question).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Failed to answer question");
                QueryOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        info!(
            outcome = outcome.kind(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Question handled"
        );
        outcome
    }

    async fn answer_inner(&self, question: &str) -> Result<QueryOutcome> {
        let retrieved = self
            .store
            .similarity_search(question, TOP_K, SIMILARITY_THRESHOLD)
            .await?;
        debug!(retrieved = retrieved.len(), "Retrieved context chunks");

        let context = join_context(retrieved.iter().map(|r| r.chunk.text.as_str()));
        if context.trim().is_empty() {
            return Ok(QueryOutcome::NoContext);
        }

        let prompt = build_prompt(question, &context);
        let params = GenerationParams {
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let answer = self.llm.generate(&prompt, &params).await?;

        Ok(QueryOutcome::Answered {
            answer,
            references: build_references(&retrieved),
        })
    }
}
