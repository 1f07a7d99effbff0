use std::sync::Arc;

use crate::llm::{GenerationBackend, GenerationRequest};

use super::error::GenerationError;
use super::prompt::build_prompt;
use super::retriever::ScoredChunk;

/// Answers a question from retrieved chunks with an extraction-only prompt.
#[derive(Clone)]
pub struct Generator {
    backend: Arc<dyn GenerationBackend>,
    temperature: f32,
    max_new_tokens: u32,
}

impl Generator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            temperature: 0.0,
            max_new_tokens: 512,
        }
    }

    pub fn with_decoding(mut self, temperature: f32, max_new_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_new_tokens = max_new_tokens;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Returns the model's answer, trimmed. The text is not otherwise checked.
    pub async fn generate(&self, chunks: &[ScoredChunk], question: &str) -> Result<String, GenerationError> {
        let prompt = build_prompt(chunks, question);
        tracing::debug!(
            backend = self.backend.name(),
            chunks = chunks.len(),
            prompt_chars = prompt.len(),
            "Sending prompt to generation backend"
        );

        let request = GenerationRequest::new(prompt)
            .with_temperature(self.temperature)
            .with_max_new_tokens(self.max_new_tokens);
        let answer = self.backend.complete(&request).await.map_err(|err| {
            tracing::error!(backend = self.backend.name(), error = %err, "Generation failed");
            err
        })?;

        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::store::ChunkRecord;
    use crate::test_support::{EchoBackend, FailingBackend};

    fn chunk(source: &str, content: &str) -> ScoredChunk {
        ScoredChunk {
            record: Arc::new(ChunkRecord::new(source, 0, content, vec![1.0])),
            score: 0.9,
        }
    }

    #[tokio::test]
    async fn answer_is_trimmed_backend_output() {
        let backend = Arc::new(EchoBackend::new());
        let generator = Generator::new(backend.clone());
        let answer = generator
            .generate(&[chunk("doc1", "Python is widely used in machine learning.")], "What language?")
            .await
            .expect("generation should work");

        assert_eq!(
            answer,
            "Echo: Source: doc1\nContent: Python is widely used in machine learning."
        );
    }

    #[tokio::test]
    async fn requests_use_configured_decoding() {
        let backend = Arc::new(EchoBackend::new());
        let generator = Generator::new(backend.clone()).with_decoding(0.0, 128);
        generator
            .generate(&[chunk("a", "alpha")], "q")
            .await
            .expect("generation should work");

        let request = backend.last_request().expect("request recorded");
        assert!(request.is_greedy());
        assert_eq!(request.max_new_tokens, 128);
        assert!(request.prompt.contains("Question:\nq\n"));
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let generator = Generator::new(Arc::new(FailingBackend::timing_out()));
        let err = generator
            .generate(&[chunk("a", "alpha")], "q")
            .await
            .expect_err("backend fails");
        assert!(matches!(err, GenerationError::Timeout(60)));
    }
}
