use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::GenerationBackend;
use super::types::GenerationRequest;
use super::{http_client, parse_body, request_error};
use crate::rag::error::GenerationError;

/// Local model service speaking the Ollama `/api/generate` protocol.
#[derive(Clone)]
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    timeout: Duration,
    client: Client,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, GenerationError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl GenerationBackend for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = json!({
            "model": self.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_new_tokens,
            },
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| request_error(e, self.timeout))?;
        let payload = parse_body(status, text)?;

        payload
            .get("response")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                GenerationError::MalformedResponse("missing `response` field".to_string())
            })
    }
}
