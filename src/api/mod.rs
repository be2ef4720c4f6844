//! HTTP API Handlers and Routes
//!
//! The REST surface of KnowBase, built on Axum.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! All paths sit under `server.api_prefix` (default `/api`).
//!
//! - `GET /api/health` - Liveness check
//! - `POST /api/chat/message` - Ask a question, get an answer with references
//! - `POST /api/documents/upload` - Upload a file (multipart field `file`)
//!
//! # OpenAPI Documentation
//!
//! When the `swagger-ui` feature is enabled, interactive API documentation
//! is available at `/swagger-ui/`.

use utoipa::OpenApi;

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

/// OpenAPI description of the API.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::chat::send_message,
        handlers::documents::upload_document,
    ),
    components(schemas(
        crate::types::ChatRequest,
        crate::types::ChatResponse,
        crate::types::UploadResponse,
        crate::types::HealthResponse,
        handlers::documents::UploadForm,
    )),
    tags(
        (name = "health", description = "Service status"),
        (name = "chat", description = "Question answering over uploaded documents"),
        (name = "documents", description = "Document ingestion"),
    ),
    info(title = "KnowBase API", description = "Minimal retrieval augmented question answering")
)]
pub struct ApiDoc;
