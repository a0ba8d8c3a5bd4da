use super::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn client_configuration() {
    let config = LocalEmbeddingConfig {
        enabled: true,
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        model: "test-model".to_string(),
        batch_size: 128,
        timeout_seconds: 30,
    };
    let client = LocalEmbeddingClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let config = LocalEmbeddingConfig::default();
    let client = LocalEmbeddingClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);
}

fn client_for(server_url: &Url) -> LocalEmbeddingClient {
    let config = LocalEmbeddingConfig {
        enabled: true,
        protocol: "http".to_string(),
        host: server_url.host_str().expect("mock url has host").to_string(),
        port: server_url.port().expect("mock url has port"),
        model: "test-model".to_string(),
        batch_size: 16,
        timeout_seconds: 5,
    };
    LocalEmbeddingClient::new(&config)
        .expect("Failed to create client")
        .with_retry_attempts(1)
}

#[tokio::test(flavor = "multi_thread")]
async fn batch_embedding_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [[1.0, 0.0], [0.0, 1.0]]
        })))
        .mount(&server)
        .await;

    let url = Url::parse(&server.uri()).expect("mock server uri should parse");
    let client = client_for(&url);
    let texts = vec!["first".to_string(), "second".to_string()];

    let vectors = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("task should not panic")
        .expect("embedding should succeed");

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test(flavor = "multi_thread")]
async fn single_text_uses_single_embed_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embedding": [0.5, 0.5]
        })))
        .mount(&server)
        .await;

    let url = Url::parse(&server.uri()).expect("mock server uri should parse");
    let client = client_for(&url);
    let texts = vec!["only".to_string()];

    let vectors = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("task should not panic")
        .expect("embedding should succeed");

    assert_eq!(vectors, vec![vec![0.5, 0.5]]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_tier_failure() {
    let config = LocalEmbeddingConfig {
        port: 1,
        timeout_seconds: 1,
        ..LocalEmbeddingConfig::default()
    };
    let client = LocalEmbeddingClient::new(&config)
        .expect("Failed to create client")
        .with_retry_attempts(1);

    let texts = vec!["text".to_string()];
    let result = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("task should not panic");

    assert!(result.is_err());
}

#[test]
fn empty_batch_short_circuits() {
    let config = LocalEmbeddingConfig::default();
    let client = LocalEmbeddingClient::new(&config).expect("Failed to create client");

    let vectors = client.embed_batch(&[]).expect("empty batch should succeed");
    assert!(vectors.is_empty());
}
