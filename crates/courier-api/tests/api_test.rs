use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use tower::ServiceExt;

use courier_api::config::{
    Config, CorsConfig, DatabaseConfig, LlmConfig, LoggingConfig, SearchConfig, ServerConfig,
};
use courier_api::error::ApiError;
use courier_api::router::build_router;
use courier_api::routes::upload::{validate_upload, UploadKind, MAX_AUDIO_BYTES, MAX_IMAGE_BYTES};
use courier_api::state::AppState;
use courier_chat::ChatService;
use courier_llm::{ModelRegistry, ProviderSet};
use courier_media::{Normalizer, TranscriberChain};
use courier_store::ChatStore;

fn test_config(dir: &tempfile::TempDir) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        cors: CorsConfig {
            enabled: false,
            origins: Vec::new(),
        },
        database: DatabaseConfig {
            path: dir.path().join("courier.db").display().to_string(),
        },
        llm: LlmConfig {
            temperature: 0.7,
            max_tokens: 2000,
            max_attempts: 2,
            attempt_timeout_secs: 5,
            backoff_ms: 1,
        },
        search: SearchConfig { result_count: 5 },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
        siliconflow_api_key: None,
        groq_api_key: None,
        openai_api_key: None,
        bocha_api_key: None,
    }
}

async fn test_state(dir: &tempfile::TempDir) -> Arc<AppState> {
    let config = test_config(dir);
    let registry = Arc::new(ModelRegistry::builtin());
    let providers = Arc::new(ProviderSet::new());
    let store = Arc::new(ChatStore::open(&config.database.path).await.unwrap());
    let transcriber = Arc::new(TranscriberChain::default());
    let chat = ChatService::new(
        registry.clone(),
        providers.clone(),
        Arc::new(Normalizer::new((*transcriber).clone())),
        store.clone(),
    );

    Arc::new(AppState::new(
        config, chat, store, registry, providers, None, transcriber,
    ))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir).await;

    let first = build_router(state.clone()).oneshot(get("/api/health")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = body_json(first).await;

    let second = build_router(state).oneshot(get("/api/health")).await.unwrap();
    let second_body = body_json(second).await;

    assert_eq!(first_body, second_body);
    assert_eq!(first_body["success"], true);
    assert_eq!(first_body["capabilities"]["siliconflow_available"], false);
    assert_eq!(first_body["capabilities"]["search_available"], false);
}

#[tokio::test]
async fn models_lists_the_registry() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir).await;

    let response = build_router(state).oneshot(get("/api/models")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 3);
    assert!(models.iter().any(|m| m["id"] == "deepseek-ai/DeepSeek-V2.5"
        && m["default"] == true
        && m["provider"] == "siliconflow"));
    assert!(models
        .iter()
        .any(|m| m["supports_image"] == true && m["provider"] == "groq"));
}

#[tokio::test]
async fn session_crud_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir).await;
    let router = build_router(state);

    let created = router
        .clone()
        .oneshot(post_json("/api/sessions", serde_json::json!({"title": "测试"})))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let created_body = body_json(created).await;
    let session_id = created_body["session"]["id"].as_str().unwrap().to_string();

    let detail = router
        .clone()
        .oneshot(get(&format!("/api/sessions/{session_id}")))
        .await
        .unwrap();
    assert_eq!(detail.status(), StatusCode::OK);
    let detail_body = body_json(detail).await;
    assert_eq!(detail_body["session"]["title"], "测试");
    assert_eq!(detail_body["messages"].as_array().unwrap().len(), 0);

    let missing = router
        .clone()
        .oneshot(get("/api/sessions/does-not-exist"))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let missing_body = body_json(missing).await;
    assert_eq!(missing_body["success"], false);
}

#[tokio::test]
async fn chat_with_empty_messages_is_a_400() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir).await;

    let response = build_router(state)
        .oneshot(post_json("/api/chat", serde_json::json!({"messages": []})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "消息不能为空");
}

#[tokio::test]
async fn chat_without_provider_keys_is_a_503() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir).await;

    let response = build_router(state)
        .oneshot(post_json(
            "/api/chat",
            serde_json::json!({"messages": [{"role": "user", "text": "hi"}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn search_without_key_is_a_503() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir).await;

    let response = build_router(state)
        .oneshot(get("/api/search?q=gold"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn stats_reports_zero_on_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(&dir).await;

    let response = build_router(state).oneshot(get("/api/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_sessions"], 0);
    assert_eq!(body["total_messages"], 0);
}

#[tokio::test]
async fn api_error_envelope_shape() {
    let response = ApiError::BadRequest("格式错误".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "格式错误");
}

#[test]
fn upload_validation_boundaries() {
    // Exactly at the limit is accepted.
    assert!(validate_upload(UploadKind::Audio, "voice.mp3", MAX_AUDIO_BYTES).is_ok());

    // One byte over is rejected with a "too large" message.
    let err = validate_upload(UploadKind::Audio, "voice.mp3", MAX_AUDIO_BYTES + 1).unwrap_err();
    let ApiError::BadRequest(message) = err else {
        panic!("expected BadRequest");
    };
    assert!(message.contains("不能超过10MB"));

    assert!(validate_upload(UploadKind::Image, "photo.png", MAX_IMAGE_BYTES).is_ok());
    let err = validate_upload(UploadKind::Image, "photo.png", MAX_IMAGE_BYTES + 1).unwrap_err();
    let ApiError::BadRequest(message) = err else {
        panic!("expected BadRequest");
    };
    assert!(message.contains("4MB"));
}

#[test]
fn upload_validation_checks_extension_and_emptiness() {
    let err = validate_upload(UploadKind::Image, "malware.exe", 100).unwrap_err();
    let ApiError::BadRequest(message) = err else {
        panic!("expected BadRequest");
    };
    assert!(message.contains("不支持的图片格式"));

    assert!(validate_upload(UploadKind::Video, "clip", 100).is_err());
    assert!(validate_upload(UploadKind::Audio, "voice.wav", 0).is_err());

    assert_eq!(validate_upload(UploadKind::Image, "PHOTO.JPG", 10).unwrap(), "image/jpeg");
    assert_eq!(validate_upload(UploadKind::Video, "clip.mp4", 10).unwrap(), "video/mp4");
}
