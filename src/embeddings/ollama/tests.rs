use super::*;
use crate::config::OllamaConfig;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn embedder_for(server: &MockServer) -> OllamaEmbedder {
    let address = server.address();
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: address.ip().to_string(),
        port: address.port(),
    };
    let client = OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_retry_attempts(1);
    OllamaEmbedder::with_client(client, "all-minilm:l6-v2".to_string())
}

#[test]
fn embedder_configuration() {
    let config = Config::default();
    let embedder = OllamaEmbedder::new(&config).expect("Failed to create embedder");

    assert_eq!(embedder.model_id(), "all-minilm:l6-v2");
    assert_eq!(embedder.client().base_url().port(), Some(11434));
}

#[tokio::test(flavor = "multi_thread")]
async fn single_embedding_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({
            "model": "all-minilm:l6-v2",
            "input": ["The sky is blue."]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "all-minilm:l6-v2",
            "embeddings": [[0.1, 0.2, 0.3]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = embedder_for(&server);
    let vector = tokio::task::spawn_blocking(move || embedder.embed("The sky is blue."))
        .await
        .expect("task should join")
        .expect("embedding should succeed");

    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_is_sent_as_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({
            "input": ["document 0", "document 1", "document 2"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = embedder_for(&server);
    let texts: Vec<String> = (0..3).map(|i| format!("document {}", i)).collect();
    let vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
        .await
        .expect("task should join")
        .expect("batch embedding should succeed");

    assert_eq!(vectors.len(), 3);
    assert_eq!(vectors[2], vec![0.5, 0.5]);
}

#[tokio::test(flavor = "multi_thread")]
async fn count_mismatch_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0]]
        })))
        .mount(&server)
        .await;

    let embedder = embedder_for(&server);
    let texts = vec!["a".to_string(), "b".to_string()];
    let result = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts))
        .await
        .expect("task should join");

    assert!(matches!(result, Err(RagError::Embedding(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "model not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let address = server.address();
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: address.ip().to_string(),
        port: address.port(),
    };
    let client = OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_retry_attempts(3);
    let embedder = OllamaEmbedder::with_client(client, "missing".to_string());

    let result = tokio::task::spawn_blocking(move || embedder.embed("text"))
        .await
        .expect("task should join");

    assert!(matches!(result, Err(RagError::Embedding(_))));
}
