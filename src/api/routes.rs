use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Endpoints relative to the API prefix.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(crate::api::handlers::health::health))
        .route(
            "/chat/message",
            post(crate::api::handlers::chat::send_message),
        )
        .route(
            "/documents/upload",
            post(crate::api::handlers::documents::upload_document),
        )
        // Uploads have no size cap
        .layer(DefaultBodyLimit::disable())
}

/// The complete application: routes mounted under `server.api_prefix`,
/// with request tracing and permissive CORS.
pub fn app(state: AppState) -> Router {
    let prefix = state.config.server.api_prefix.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = if prefix.is_empty() {
        create_router()
    } else {
        Router::new().nest(&prefix, create_router())
    };

    let router = with_swagger(api);

    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(feature = "swagger-ui")]
fn with_swagger(router: Router<AppState>) -> Router<AppState> {
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    router.merge(
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", crate::api::ApiDoc::openapi()),
    )
}

#[cfg(not(feature = "swagger-ui"))]
fn with_swagger(router: Router<AppState>) -> Router<AppState> {
    router
}
