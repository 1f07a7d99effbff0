use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{http_client, request_error, success_body, validate_vector, Embedder};
use crate::rag::error::EmbeddingError;

/// Local model service speaking the Ollama `/api/embeddings` protocol.
#[derive(Clone)]
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    timeout: Duration,
    client: Client,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Option<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, EmbeddingError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = json!({
            "model": self.model,
            "prompt": text,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;
        let payload = success_body(res, self.timeout).await?;

        let parsed: OllamaEmbeddingResponse = serde_json::from_str(&payload)
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;
        let embedding = parsed.embedding.ok_or_else(|| {
            EmbeddingError::MalformedResponse("missing `embedding` field".to_string())
        })?;

        validate_vector(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_stub;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;

    fn embedder(base_url: &str) -> OllamaEmbedder {
        OllamaEmbedder::new(base_url, "nomic-embed-text", Duration::from_secs(5))
            .expect("client should build")
    }

    #[tokio::test]
    async fn returns_embedding_field() {
        let app = Router::new().route(
            "/api/embeddings",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "nomic-embed-text");
                assert_eq!(body["prompt"], "hello");
                Json(json!({ "embedding": [0.5, -0.25, 1.0] }))
            }),
        );
        let base = spawn_stub(app).await;

        let vector = embedder(&base).embed("hello").await.expect("embed should work");
        assert_eq!(vector, vec![0.5, -0.25, 1.0]);
    }

    #[tokio::test]
    async fn non_success_status_is_status_error() {
        let app = Router::new().route(
            "/api/embeddings",
            post(|| async { (StatusCode::NOT_FOUND, "model not found") }),
        );
        let base = spawn_stub(app).await;

        let err = embedder(&base).embed("hello").await.expect_err("404 must fail");
        match err {
            EmbeddingError::Status { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("model not found"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_field_is_malformed_response() {
        let app = Router::new().route(
            "/api/embeddings",
            post(|| async { Json(json!({ "vector": [1.0] })) }),
        );
        let base = spawn_stub(app).await;

        let err = embedder(&base).embed("hello").await.expect_err("missing field must fail");
        assert!(matches!(err, EmbeddingError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn empty_vector_is_malformed_response() {
        let app = Router::new().route(
            "/api/embeddings",
            post(|| async { Json(json!({ "embedding": [] })) }),
        );
        let base = spawn_stub(app).await;

        let err = embedder(&base).embed("hello").await.expect_err("empty vector must fail");
        assert!(matches!(err, EmbeddingError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let base = crate::test_support::unused_base_url();
        let err = embedder(&base).embed("hello").await.expect_err("connect must fail");
        assert!(matches!(err, EmbeddingError::Transport(_)));
    }

    #[tokio::test]
    async fn slow_backend_is_timeout_error() {
        let app = Router::new().route(
            "/api/embeddings",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({ "embedding": [1.0] }))
            }),
        );
        let base = spawn_stub(app).await;
        let embedder = OllamaEmbedder::new(&base, "m", Duration::from_millis(200))
            .expect("client should build");

        let err = embedder.embed("hello").await.expect_err("timeout must fail");
        assert!(matches!(err, EmbeddingError::Timeout(_)));
    }

    #[tokio::test]
    #[ignore]
    async fn live_ollama_embedding() {
        let embedder = embedder(crate::core::config::settings::DEFAULT_OLLAMA_HOST);
        let vector = embedder
            .embed("Python is widely used in machine learning.")
            .await
            .expect("live ollama should answer");
        println!("dimension: {}", vector.len());
        assert!(!vector.is_empty());
    }
}
