mod common;

use axum::{
    body::Bytes,
    http::{header, HeaderValue, StatusCode},
};
use axum_test::{
    multipart::{MultipartForm, Part},
    TestServer,
};
use common::mocks::MockLLMClient;
use knowbase::{rag::query::NO_CONTEXT_ANSWER, KnowbaseConfig};
use serde_json::{json, Value};

const GUIDE: &str = "KnowBase accepts PDF, Word and plain text uploads.\n\n\
                     Uploaded files are split into chunks and indexed for questions.\n\n\
                     Answers cite the file and chunk they came from.";

async fn create_test_server(llm: MockLLMClient) -> TestServer {
    let app = common::test_app(llm).await;
    TestServer::new(app).expect("Failed to create test server")
}

fn file_form(filename: &str, bytes: &[u8]) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_type("text/plain"),
    )
}

async fn upload(server: &TestServer, filename: &str, bytes: &[u8]) -> String {
    let response = server
        .post("/api/documents/upload")
        .multipart(file_form(filename, bytes))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["message"]
        .as_str()
        .expect("message should be a string")
        .to_string()
}

// ============= Health =============

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(MockLLMClient::new("unused")).await;

    let response = server.get("/api/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "status": "OK",
        "service": "KnowBase RAG System"
    }));
}

#[tokio::test]
async fn test_health_check_multiple_times() {
    let server = create_test_server(MockLLMClient::new("unused")).await;

    for _ in 0..5 {
        let response = server.get("/api/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "OK");
    }
}

#[tokio::test]
async fn test_routes_follow_configured_prefix() {
    let mut config = KnowbaseConfig::default();
    config.server.api_prefix = "/kb".to_string();
    let state = common::test_state(config, MockLLMClient::new("unused")).await;
    let server = TestServer::new(knowbase::api::routes::app(state)).unwrap();

    server.get("/kb/health").await.assert_status_ok();
    server.get("/api/health").await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let server = create_test_server(MockLLMClient::new("unused")).await;

    let response = server
        .get("/api/health")
        .add_header(
            header::ORIGIN,
            HeaderValue::from_static("http://localhost:5173"),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
}

// ============= Upload =============

#[tokio::test]
async fn test_upload_text_document() {
    let server = create_test_server(MockLLMClient::new("unused")).await;

    let message = upload(&server, "guide.txt", GUIDE.as_bytes()).await;

    assert_eq!(message, "文档 'guide.txt' 上传成功，共处理 1 个文档块");
}

#[tokio::test]
async fn test_upload_empty_file_stores_nothing() {
    let server = create_test_server(MockLLMClient::new("unused")).await;

    let message = upload(&server, "empty.txt", b"").await;

    assert_eq!(message, "文档 'empty.txt' 上传成功，共处理 0 个文档块");
}

#[tokio::test]
async fn test_upload_unparseable_file_reports_failure() {
    let server = create_test_server(MockLLMClient::new("unused")).await;

    let message = upload(&server, "legacy.doc", b"\xd0\xcf\x11\xe0 binary").await;

    assert!(
        message.starts_with("文档上传失败: "),
        "unexpected message: {}",
        message
    );
}

#[tokio::test]
async fn test_upload_without_file_part_is_rejected() {
    let server = create_test_server(MockLLMClient::new("unused")).await;

    let form = MultipartForm::new().add_text("note", "no file here");
    let response = server.post("/api/documents/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_upload_non_multipart_is_rejected() {
    let server = create_test_server(MockLLMClient::new("unused")).await;

    let response = server
        .post("/api/documents/upload")
        .json(&json!({"file": "guide.txt"}))
        .await;

    assert!(response.status_code().is_client_error());
}

// ============= Chat =============

#[tokio::test]
async fn test_chat_without_documents_skips_generation() {
    let llm = MockLLMClient::new("should not be used");
    let server = create_test_server(llm.clone()).await;

    let response = server
        .post("/api/chat/message")
        .json(&json!({"message": "What's the weather like today?"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["answer"], NO_CONTEXT_ANSWER);
    assert_eq!(body["references"], json!([]));
    assert!(body["timestamp"].as_i64().unwrap() > 0);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_chat_answers_from_uploaded_document() {
    let llm = MockLLMClient::new("KnowBase supports PDF, Word and text files.");
    let server = create_test_server(llm.clone()).await;

    upload(&server, "guide.txt", GUIDE.as_bytes()).await;

    let response = server
        .post("/api/chat/message")
        .json(&json!({"message": "Does KnowBase support PDF and Word uploads?"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["answer"], "KnowBase supports PDF, Word and text files.");
    assert_eq!(body["references"], json!(["guide.txt (片段 1)"]));

    let (prompt, params) = llm.last_prompt().expect("LLM should be called");
    assert!(prompt.contains("Does KnowBase support PDF and Word uploads?"));
    assert!(prompt.contains("Uploaded files are split into chunks"));
    assert_eq!(params.temperature, 0.7);
    assert_eq!(params.max_tokens, 500);
}

#[tokio::test]
async fn test_chat_unrelated_question_after_upload() {
    let llm = MockLLMClient::new("should not be used");
    let server = create_test_server(llm.clone()).await;

    upload(&server, "guide.txt", GUIDE.as_bytes()).await;

    let response = server
        .post("/api/chat/message")
        .json(&json!({"message": "今天天气怎么样？"}))
        .await;

    let body: Value = response.json();
    assert_eq!(body["answer"], NO_CONTEXT_ANSWER);
    assert_eq!(body["references"], json!([]));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_chat_generation_failure_is_reported_in_answer() {
    let server = create_test_server(MockLLMClient::failing()).await;

    upload(&server, "guide.txt", GUIDE.as_bytes()).await;

    let response = server
        .post("/api/chat/message")
        .json(&json!({"message": "Does KnowBase support PDF and Word uploads?"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let answer = body["answer"].as_str().unwrap();
    assert!(answer.starts_with("处理您的问题时出现错误: "));
    assert!(answer.contains("Mock LLM failure"));
    assert_eq!(body["references"], json!([]));
}

#[tokio::test]
async fn test_chat_malformed_json_is_rejected() {
    let server = create_test_server(MockLLMClient::new("unused")).await;

    let response = server
        .post("/api/chat/message")
        .bytes(Bytes::from_static(b"{\"message\": "))
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_chat_missing_message_is_rejected() {
    let server = create_test_server(MockLLMClient::new("unused")).await;

    let response = server
        .post("/api/chat/message")
        .json(&json!({"question": "wrong field"}))
        .await;

    assert!(response.status_code().is_client_error());
}
