use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::GenerationBackend;
use super::types::GenerationRequest;
use super::{http_client, parse_body, request_error};
use crate::rag::error::GenerationError;

/// Hosted text-generation endpoint authenticated with a bearer token.
#[derive(Clone)]
pub struct HuggingFaceGenerator {
    url: String,
    token: String,
    timeout: Duration,
    client: Client,
}

impl HuggingFaceGenerator {
    pub fn new(
        endpoint: &str,
        model: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            url: format!("{}/{}", endpoint.trim_end_matches('/'), model),
            token: token.to_string(),
            timeout,
            client: http_client(timeout)?,
        })
    }
}

fn request_body(request: &GenerationRequest) -> Value {
    // The hosted API rejects temperature 0; greedy decoding is requested instead.
    let parameters = if request.is_greedy() {
        json!({
            "max_new_tokens": request.max_new_tokens,
            "return_full_text": false,
            "do_sample": false,
        })
    } else {
        json!({
            "max_new_tokens": request.max_new_tokens,
            "return_full_text": false,
            "do_sample": true,
            "temperature": request.temperature,
        })
    };

    json!({
        "inputs": request.prompt,
        "parameters": parameters,
        "options": { "wait_for_model": true },
    })
}

fn extract_generated_text(payload: &Value) -> Result<String, GenerationError> {
    if let Some(message) = payload.get("error").and_then(Value::as_str) {
        return Err(GenerationError::BackendReported(message.to_string()));
    }

    let first = match payload {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(payload),
        _ => None,
    };

    first
        .and_then(|item| item.get("generated_text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            GenerationError::MalformedResponse("missing `generated_text` field".to_string())
        })
}

#[async_trait]
impl GenerationBackend for HuggingFaceGenerator {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let res = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&request_body(request))
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| request_error(e, self.timeout))?;
        let payload = parse_body(status, text)?;
        extract_generated_text(&payload)
    }
}
