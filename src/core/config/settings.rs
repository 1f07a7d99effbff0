//! Typed runtime settings.
//!
//! Loaded once at startup by [`super::ConfigService`]; the backend strategy for
//! embedding and generation is resolved here and never re-evaluated per call.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_HF_EMBEDDING_URL: &str =
    "https://api-inference.huggingface.co/pipeline/feature-extraction";
pub const DEFAULT_HF_GENERATION_URL: &str = "https://api-inference.huggingface.co/models";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub ingestion: IngestionSettings,
    /// Hosted inference token. Its presence selects the hosted backends.
    pub huggingface_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub window_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            window_size: 400,
            overlap: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub default_top_k: usize,
    pub max_top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_top_k: 3,
            max_top_k: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub ollama_host: String,
    pub ollama_model: String,
    pub huggingface_url: String,
    pub huggingface_model: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            ollama_model: "nomic-embed-text".to_string(),
            huggingface_url: DEFAULT_HF_EMBEDDING_URL.to_string(),
            huggingface_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            timeout_secs: 30,
        }
    }
}

impl EmbeddingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub ollama_host: String,
    pub ollama_model: String,
    pub huggingface_url: String,
    pub huggingface_model: String,
    pub temperature: f32,
    pub max_new_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            ollama_model: "phi3".to_string(),
            huggingface_url: DEFAULT_HF_GENERATION_URL.to_string(),
            huggingface_model: "HuggingFaceH4/zephyr-7b-beta".to_string(),
            temperature: 0.0,
            max_new_tokens: 512,
            timeout_secs: 60,
        }
    }
}

impl GenerationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Re-ingesting a source appends another full copy of its chunks.
    #[default]
    Append,
    /// Re-ingesting a source that already has records fails.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    pub duplicate_policy: DuplicatePolicy,
    pub bootstrap_dir: Option<PathBuf>,
    pub store_warn_threshold: usize,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Append,
            bootstrap_dir: None,
            store_warn_threshold: 50_000,
        }
    }
}

/// Which model service a backend talks to, decided once from settings.
#[derive(Clone, PartialEq, Eq)]
pub enum BackendSelection {
    HuggingFace {
        endpoint: String,
        model: String,
        token: String,
    },
    Ollama {
        host: String,
        model: String,
    },
}

impl BackendSelection {
    pub fn name(&self) -> &'static str {
        match self {
            BackendSelection::HuggingFace { .. } => "huggingface",
            BackendSelection::Ollama { .. } => "ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            BackendSelection::HuggingFace { model, .. } | BackendSelection::Ollama { model, .. } => {
                model
            }
        }
    }
}

impl fmt::Debug for BackendSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendSelection::HuggingFace {
                endpoint, model, ..
            } => f
                .debug_struct("HuggingFace")
                .field("endpoint", endpoint)
                .field("model", model)
                .field("token", &"****")
                .finish(),
            BackendSelection::Ollama { host, model } => f
                .debug_struct("Ollama")
                .field("host", host)
                .field("model", model)
                .finish(),
        }
    }
}

impl Settings {
    fn hosted_token(&self) -> Option<&str> {
        self.huggingface_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn embedding_backend(&self) -> BackendSelection {
        match self.hosted_token() {
            Some(token) => BackendSelection::HuggingFace {
                endpoint: self.embedding.huggingface_url.clone(),
                model: self.embedding.huggingface_model.clone(),
                token: token.to_string(),
            },
            None => BackendSelection::Ollama {
                host: self.embedding.ollama_host.clone(),
                model: self.embedding.ollama_model.clone(),
            },
        }
    }

    pub fn generation_backend(&self) -> BackendSelection {
        match self.hosted_token() {
            Some(token) => BackendSelection::HuggingFace {
                endpoint: self.generation.huggingface_url.clone(),
                model: self.generation.huggingface_model.clone(),
                token: token.to_string(),
            },
            None => BackendSelection::Ollama {
                host: self.generation.ollama_host.clone(),
                model: self.generation.ollama_model.clone(),
            },
        }
    }

    /// Applies `HF_TOKEN`, `OLLAMA_HOST` and `PORT` on top of file values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("HF_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.huggingface_token = Some(token);
        }

        if let Some(host) = lookup("OLLAMA_HOST").filter(|v| !v.trim().is_empty()) {
            let host = normalize_host(&host);
            self.embedding.ollama_host = host.clone();
            self.generation.ollama_host = host;
        }

        if let Some(port) = lookup("PORT").and_then(|v| v.trim().parse::<u16>().ok()) {
            self.server.port = port;
        }
    }
}

/// `OLLAMA_HOST` is commonly given as `host:port` without a scheme.
fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
