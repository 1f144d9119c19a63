use futures::StreamExt;

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use polychat::config::OllamaConfig;
use polychat::providers::{Message, OllamaProvider, Provider, StreamFragment, FALLBACK_MODELS};

fn provider_for(server: &MockServer) -> OllamaProvider {
    OllamaProvider::new(OllamaConfig {
        host: server.uri(),
        model: "llama3".to_string(),
    })
    .unwrap()
}

/// Model listing returns the names from /api/tags
#[tokio::test]
async fn test_list_models_from_tags() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [
                { "name": "llama3:latest" },
                { "name": "mistral:7b" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let models = provider_for(&server).list_models().await.unwrap();
    assert_eq!(models, vec!["llama3:latest", "mistral:7b"]);
}

/// A failing tags endpoint degrades to the fallback list instead of erroring
#[tokio::test]
async fn test_list_models_falls_back_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let models = provider_for(&server).list_models().await.unwrap();
    assert_eq!(models, FALLBACK_MODELS);
}

/// An unreachable server also degrades to the fallback list
#[tokio::test]
async fn test_list_models_falls_back_when_unreachable() {
    let provider = OllamaProvider::new(OllamaConfig {
        host: "http://127.0.0.1:1".to_string(),
        model: "llama3".to_string(),
    })
    .unwrap();

    let models = provider.list_models().await.unwrap();
    assert_eq!(models, FALLBACK_MODELS);
}

/// A malformed tags payload degrades to the fallback list
#[tokio::test]
async fn test_list_models_falls_back_on_bad_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let models = provider_for(&server).list_models().await.unwrap();
    assert_eq!(models, FALLBACK_MODELS);
}

/// Streaming a chat turn yields one fragment per NDJSON line, skipping
/// malformed lines
#[tokio::test]
async fn test_stream_chat_yields_fragments() {
    let server = MockServer::start().await;

    let body = concat!(
        r#"{"message":{"content":"Hel"},"done":false}"#, "\n",
        "{this line is garbage}\n",
        r#"{"message":{"content":"lo"},"done":false}"#, "\n",
        r#"{"message":{"content":""},"done":true}"#, "\n",
    );

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama3",
            "stream": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let stream = provider.stream_chat("hi", &[]).await.unwrap();
    let fragments: Vec<_> = stream.collect().await;

    let texts: Vec<String> = fragments
        .into_iter()
        .map(|f| match f.unwrap() {
            StreamFragment::OutputText(s) => s,
            other => panic!("unexpected fragment {:?}", other),
        })
        .collect();

    assert_eq!(texts, vec!["Hel", "lo"]);
}

/// History is filtered to text turns and the prompt appended
#[tokio::test]
async fn test_stream_chat_sends_conversation_window() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(serde_json::json!({
            "messages": [
                { "role": "user", "content": "earlier question" },
                { "role": "assistant", "content": "earlier answer" },
                { "role": "user", "content": "next question" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            concat!(r#"{"message":{"content":"ok"},"done":true}"#, "\n"),
            "application/x-ndjson",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![
        Message::user("earlier question"),
        Message::assistant("earlier answer"),
    ];

    let provider = provider_for(&server);
    let stream = provider
        .stream_chat("next question", &history)
        .await
        .unwrap();
    let fragments: Vec<_> = stream.collect().await;
    assert_eq!(fragments.len(), 1);
}

/// A non-success status is an error before any fragment is produced
#[tokio::test]
async fn test_stream_chat_rejected_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let result = provider.stream_chat("hi", &[]).await;

    let err = result.err().expect("expected request to be rejected");
    assert!(err.to_string().contains("404"));
}
