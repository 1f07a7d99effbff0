use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{http_client, request_error, success_body, validate_vector, Embedder};
use crate::rag::error::EmbeddingError;

/// Hosted feature-extraction endpoint authenticated with a bearer token.
#[derive(Clone)]
pub struct HuggingFaceEmbedder {
    url: String,
    token: String,
    timeout: Duration,
    client: Client,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtraction {
    Sentence(Vec<f32>),
    Tokens(Vec<Vec<f32>>),
}

impl HuggingFaceEmbedder {
    pub fn new(
        endpoint: &str,
        model: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        Ok(Self {
            url: format!("{}/{}", endpoint.trim_end_matches('/'), model),
            token: token.to_string(),
            timeout,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = json!({
            "inputs": text,
            "options": { "wait_for_model": true },
        });

        let res = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;
        let payload = success_body(res, self.timeout).await?;

        let parsed: FeatureExtraction = serde_json::from_str(&payload).map_err(|_| {
            EmbeddingError::MalformedResponse(format!(
                "expected a numeric vector, got: {}",
                truncate(&payload, 200)
            ))
        })?;

        let vector = match parsed {
            FeatureExtraction::Sentence(vector) => vector,
            FeatureExtraction::Tokens(rows) => mean_pool(rows)?,
        };
        validate_vector(vector)
    }
}

/// Averages token-level rows into one sentence vector.
fn mean_pool(rows: Vec<Vec<f32>>) -> Result<Vec<f32>, EmbeddingError> {
    let Some(first) = rows.first() else {
        return Err(EmbeddingError::MalformedResponse(
            "embedding response has no rows".to_string(),
        ));
    };
    let dim = first.len();
    if rows.iter().any(|row| row.len() != dim) {
        return Err(EmbeddingError::MalformedResponse(
            "embedding rows have inconsistent lengths".to_string(),
        ));
    }

    let count = rows.len() as f32;
    let mut pooled = vec![0.0f32; dim];
    for row in &rows {
        for (acc, value) in pooled.iter_mut().zip(row) {
            *acc += value;
        }
    }
    pooled.iter_mut().for_each(|v| *v /= count);
    Ok(pooled)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
