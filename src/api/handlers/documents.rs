use crate::{
    types::{AppError, Result, UploadResponse},
    AppState,
};
use axum::{
    extract::{Multipart, State},
    Json,
};
use utoipa::ToSchema;

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

/// OpenAPI shape of the upload form.
#[derive(ToSchema)]
pub struct UploadForm {
    /// The document to ingest
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Upload a document into the knowledge base
///
/// The file is parsed, split and stored. Processing failures are reported in
/// `message` with status 200; only a malformed request is rejected.
#[utoipa::path(
    post,
    path = "/api/documents/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Processing result", body = UploadResponse),
        (status = 400, description = "Missing `file` part or malformed multipart body")
    ),
    tag = "documents"
)]
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file: {}", e)))?;

        tracing::info!(filename = %filename, bytes = data.len(), "Received upload");

        let outcome = state.document_service.upload(&data, &filename).await;
        return Ok(Json(UploadResponse {
            message: outcome.message(),
        }));
    }

    Err(AppError::InvalidInput(format!(
        "Required part '{}' is not present",
        FILE_FIELD
    )))
}
