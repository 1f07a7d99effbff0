//! Deterministic stand-ins for the network backends, shared by unit tests.

use std::net::TcpListener as StdTcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

use crate::llm::{GenerationBackend, GenerationRequest};
use crate::rag::embedding::Embedder;
use crate::rag::error::{EmbeddingError, GenerationError};

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("stub listener should bind");
    let addr = listener.local_addr().expect("stub listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    format!("http://{}", addr)
}

/// A base URL nothing is listening on.
pub fn unused_base_url() -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{}", addr)
}

fn fnv1a(token: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in token.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Bag-of-words embedder: each lowercased word bumps one hashed bucket.
/// Texts sharing words score positively; disjoint texts score near zero.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for word in text.split_whitespace() {
            let token: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if token.is_empty() {
                continue;
            }
            let bucket = (fnv1a(&token) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        if vector.iter().all(|v| *v == 0.0) {
            vector[0] = 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vector(text))
    }
}

/// Hashing embedder that sleeps before every call, so work interleaves
/// with other tasks the way a network embedder does.
pub struct SlowEmbedder {
    inner: HashingEmbedder,
    delay: Duration,
}

impl SlowEmbedder {
    pub fn new(dimension: usize, delay: Duration) -> Self {
        Self {
            inner: HashingEmbedder::new(dimension),
            delay,
        }
    }
}

#[async_trait]
impl Embedder for SlowEmbedder {
    fn name(&self) -> &str {
        "slow"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        tokio::time::sleep(self.delay).await;
        self.inner.embed(text).await
    }
}

/// Hashing embedder that fails on one specific call (0-based), or on every
/// call when no index is given.
pub struct FailingEmbedder {
    inner: HashingEmbedder,
    fail_on: Option<usize>,
    calls: AtomicUsize,
}

impl FailingEmbedder {
    pub fn fail_on_call(fail_on: usize, dimension: usize) -> Self {
        Self {
            inner: HashingEmbedder::new(dimension),
            fail_on: Some(fail_on),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always(dimension: usize) -> Self {
        Self {
            inner: HashingEmbedder::new(dimension),
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.map_or(true, |n| n == call) {
            return Err(EmbeddingError::Transport(format!(
                "connection refused on call {}",
                call
            )));
        }
        self.inner.embed(text).await
    }
}

/// Generation stub answering with the context block of the prompt it received.
#[derive(Default)]
pub struct EchoBackend {
    last_request: Mutex<Option<GenerationRequest>>,
}

impl EchoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

#[async_trait]
impl GenerationBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        *self.last_request.lock().unwrap_or_else(|p| p.into_inner()) = Some(request.clone());
        let context = request
            .prompt
            .split_once("Context:\n")
            .map(|(_, rest)| rest)
            .and_then(|rest| rest.split_once("\n\nQuestion:").map(|(ctx, _)| ctx))
            .unwrap_or_default();
        Ok(format!("  Echo: {}\n", context))
    }
}

/// Generation stub that always fails with the given error factory.
pub struct FailingBackend {
    make_error: fn() -> GenerationError,
}

impl FailingBackend {
    pub fn new(make_error: fn() -> GenerationError) -> Self {
        Self { make_error }
    }

    pub fn timing_out() -> Self {
        Self::new(|| GenerationError::Timeout(60))
    }
}

#[async_trait]
impl GenerationBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err((self.make_error)())
    }
}
