//! プロバイダールーターの HTTP 統合テスト（wiremock）

use std::sync::Arc;

use po_core::domain::settings::{
    ProviderKind, KEY_GEMINI_API_KEY, KEY_GROQ_API_KEY, KEY_OPENAI_API_KEY, KEY_SELECTED_PROVIDER,
};
use po_core::infra::rewriter::prompts::OPTIMIZATION_SYSTEM_PROMPT;
use po_core::infra::rewriter::{EndpointConfig, ProviderConfig, ProviderRouter, RewriteError, Rewriter};
use po_core::infra::storage::MemorySettingsStore;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const GEMINI_PATH: &str = "/models/gemini-1.5-flash:generateContent";
const CHAT_PATH: &str = "/chat/completions";

fn config_for(server: &MockServer) -> ProviderConfig {
    let defaults = ProviderConfig::default();
    ProviderConfig {
        gemini: EndpointConfig::new(server.uri(), defaults.gemini.model),
        openai: EndpointConfig::new(server.uri(), defaults.openai.model),
        groq: EndpointConfig::new(server.uri(), defaults.groq.model),
        timeout: None,
    }
}

fn router(server: &MockServer, entries: &[(&str, &str)]) -> ProviderRouter {
    let store = MemorySettingsStore::with_entries(entries.iter().copied());
    ProviderRouter::new(Arc::new(store), config_for(server)).unwrap()
}

fn chat_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}

#[tokio::test]
async fn test_gemini_success_is_trimmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(query_param("key", "AIza-test"))
        .and(body_partial_json(json!({
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 1000 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "  Rewritten by Gemini \n" }] } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = router(
        &server,
        &[(KEY_SELECTED_PROVIDER, "gemini"), (KEY_GEMINI_API_KEY, "AIza-test")],
    );
    assert_eq!(router.rewrite("fix my bug").await.unwrap(), "Rewritten by Gemini");

    // テンプレートはプロンプトの前置きとして埋め込まれる
    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(text.starts_with(OPTIMIZATION_SYSTEM_PROMPT));
    assert!(text.ends_with("\n\nUser prompt to optimize:\nfix my bug"));
}

#[tokio::test]
async fn test_openai_success_uses_bearer_and_system_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.7,
            "max_tokens": 1000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("\nRewritten by OpenAI  ")))
        .expect(1)
        .mount(&server)
        .await;

    let router = router(
        &server,
        &[(KEY_SELECTED_PROVIDER, "openai"), (KEY_OPENAI_API_KEY, "sk-test")],
    );
    assert_eq!(router.rewrite("fix my bug").await.unwrap(), "Rewritten by OpenAI");

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], OPTIMIZATION_SYSTEM_PROMPT);
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "fix my bug");
}

#[tokio::test]
async fn test_groq_is_default_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("authorization", "Bearer gsk-test"))
        .and(body_partial_json(json!({ "model": "llama-3.1-8b-instant" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Rewritten by Groq")))
        .expect(1)
        .mount(&server)
        .await;

    let router = router(&server, &[(KEY_GROQ_API_KEY, "gsk-test")]);
    assert_eq!(router.rewrite("fix my bug").await.unwrap(), "Rewritten by Groq");
}

#[tokio::test]
async fn test_missing_credential_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("unused")))
        .expect(0)
        .mount(&server)
        .await;

    for (selection, kind) in [
        ("gemini", ProviderKind::Gemini),
        ("openai", ProviderKind::OpenAi),
        ("groq", ProviderKind::Groq),
    ] {
        let router = router(
            &server,
            &[(KEY_SELECTED_PROVIDER, selection), (kind.credential_key(), "   ")],
        );
        let err = router.rewrite("fix my bug").await.unwrap_err();
        assert_eq!(err, RewriteError::MissingCredential(kind));
    }
}

#[tokio::test]
async fn test_unknown_provider_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let router = router(
        &server,
        &[(KEY_SELECTED_PROVIDER, "claude"), (KEY_GROQ_API_KEY, "gsk-test")],
    );
    let err = router.rewrite("fix my bug").await.unwrap_err();
    assert_eq!(err, RewriteError::UnknownProvider("claude".to_string()));
    assert_eq!(err.to_string(), "Unknown provider: claude");
}

#[tokio::test]
async fn test_upstream_error_message_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let router = router(
        &server,
        &[(KEY_SELECTED_PROVIDER, "openai"), (KEY_OPENAI_API_KEY, "sk-bad")],
    );
    let err = router.rewrite("fix my bug").await.unwrap_err();
    assert_eq!(
        err,
        RewriteError::ProviderHttp {
            provider: ProviderKind::OpenAi,
            status: 401,
            message: "Incorrect API key provided".to_string(),
        }
    );
}

#[tokio::test]
async fn test_unparseable_error_body_mentions_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>unavailable</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let router = router(
        &server,
        &[(KEY_SELECTED_PROVIDER, "gemini"), (KEY_GEMINI_API_KEY, "AIza-test")],
    );
    let err = router.rewrite("fix my bug").await.unwrap_err();
    match &err {
        RewriteError::ProviderHttp { status, message, .. } => {
            assert_eq!(*status, 503);
            assert!(message.starts_with("Gemini API error: 503"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_or_missing_text_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("   ")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let groq = router(&server, &[(KEY_GROQ_API_KEY, "gsk-test")]);
    assert_eq!(
        groq.rewrite("a").await.unwrap_err(),
        RewriteError::EmptyResponse(ProviderKind::Groq)
    );
    assert_eq!(
        groq.rewrite("b").await.unwrap_err(),
        RewriteError::EmptyResponse(ProviderKind::Groq)
    );

    let gemini = router(
        &server,
        &[(KEY_SELECTED_PROVIDER, "gemini"), (KEY_GEMINI_API_KEY, "AIza-test")],
    );
    assert_eq!(
        gemini.rewrite("c").await.unwrap_err(),
        RewriteError::EmptyResponse(ProviderKind::Gemini)
    );
}

#[tokio::test]
async fn test_transport_failure() {
    // 一度 bind して閉じたポートは接続を受け付けない
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let closed = format!("http://127.0.0.1:{port}");
    let defaults = ProviderConfig::default();
    let config = ProviderConfig {
        groq: EndpointConfig::new(closed, defaults.groq.model),
        timeout: None,
        ..defaults
    };

    let store = MemorySettingsStore::with_entries([(KEY_GROQ_API_KEY, "gsk-test")]);
    let router = ProviderRouter::new(Arc::new(store), config).unwrap();
    let err = router.rewrite("fix my bug").await.unwrap_err();
    assert!(matches!(err, RewriteError::Transport(_)), "{err:?}");
}
