use crate::{
    types::{ChatRequest, ChatResponse},
    AppState,
};
use axum::{extract::State, Json};

/// Ask a question against the uploaded documents
///
/// Always answers with 200; retrieval or generation problems are reported
/// inside `answer`.
#[utoipa::path(
    post,
    path = "/api/chat/message",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Answer with references", body = ChatResponse),
        (status = 400, description = "Malformed request body"),
        (status = 415, description = "Body is not JSON"),
        (status = 422, description = "Missing `message` field")
    ),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let outcome = state.chat_service.answer(&payload.message).await;
    Json(outcome.into())
}
