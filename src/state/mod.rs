use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::{AppPaths, Settings};
use crate::llm::{build_generation_backend, GenerationBackend};
use crate::rag::{
    build_embedder, DocumentStore, Embedder, Generator, IngestReport, IngestionPipeline,
    QueryService, Retriever, WordChunker,
};

pub mod error;

use error::InitializationError;

/// Application state shared by every route.
///
/// The store is created here and handed to both the ingestion pipeline and
/// the query service; nothing else owns it.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Arc<Settings>,
    pub store: Arc<DocumentStore>,
    pub ingestion: IngestionPipeline,
    pub query: QueryService,
    pub embedding_backend: String,
    pub generation_backend: String,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Builds the state from loaded settings, resolving both backends once.
    pub fn initialize(paths: Arc<AppPaths>, settings: Settings) -> Result<Arc<Self>, InitializationError> {
        let embedding_selection = settings.embedding_backend();
        let generation_selection = settings.generation_backend();
        tracing::info!(
            "Embedding backend: {} ({})",
            embedding_selection.name(),
            embedding_selection.model()
        );
        tracing::info!(
            "Generation backend: {} ({})",
            generation_selection.name(),
            generation_selection.model()
        );

        let embedder = build_embedder(&embedding_selection, settings.embedding.timeout())
            .map_err(InitializationError::Embedding)?;
        let backend = build_generation_backend(&generation_selection, settings.generation.timeout())
            .map_err(InitializationError::Generation)?;

        Self::from_parts(paths, settings, embedder, backend)
    }

    /// Wires the RAG components around caller-supplied backends.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        backend: Arc<dyn GenerationBackend>,
    ) -> Result<Arc<Self>, InitializationError> {
        let chunker = WordChunker::new(settings.chunking.window_size, settings.chunking.overlap)?;
        let store = Arc::new(DocumentStore::new());

        let ingestion = IngestionPipeline::new(store.clone(), embedder.clone(), chunker)
            .with_duplicate_policy(settings.ingestion.duplicate_policy)
            .with_warn_threshold(settings.ingestion.store_warn_threshold);

        let generator = Generator::new(backend.clone()).with_decoding(
            settings.generation.temperature,
            settings.generation.max_new_tokens,
        );
        let query = QueryService::new(Retriever::new(store.clone(), embedder.clone()), generator)
            .with_top_k_bounds(settings.retrieval.default_top_k, settings.retrieval.max_top_k);

        Ok(Arc::new(AppState {
            paths,
            embedding_backend: embedder.name().to_string(),
            generation_backend: backend.name().to_string(),
            settings: Arc::new(settings),
            store,
            ingestion,
            query,
            started_at: Utc::now(),
        }))
    }

    pub fn bootstrap_dir(&self) -> PathBuf {
        self.settings
            .ingestion
            .bootstrap_dir
            .clone()
            .unwrap_or_else(|| self.paths.default_bootstrap_dir())
    }

    /// Ingests the documents found in the bootstrap directory.
    pub async fn bootstrap(&self) -> Vec<IngestReport> {
        let dir = self.bootstrap_dir();
        tracing::info!("Bootstrapping documents from {}", dir.display());
        let reports = self.ingestion.ingest_directory(&dir).await;
        let chunks: usize = reports.iter().map(|r| r.chunks_added).sum();
        tracing::info!(
            documents = reports.len(),
            chunks,
            "Bootstrap ingestion finished"
        );
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DuplicatePolicy;
    use crate::rag::error::IngestError;
    use crate::test_support::{EchoBackend, HashingEmbedder};

    fn state_with(settings: Settings, root: &std::path::Path) -> Arc<AppState> {
        let paths = Arc::new(AppPaths::with_dirs(root.to_path_buf(), root.to_path_buf()));
        AppState::from_parts(
            paths,
            settings,
            Arc::new(HashingEmbedder::new(64)),
            Arc::new(EchoBackend::new()),
        )
        .expect("state should build")
    }

    #[test]
    fn from_parts_records_backend_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = state_with(Settings::default(), dir.path());
        assert_eq!(state.embedding_backend, "hashing");
        assert_eq!(state.generation_backend, "echo");
        assert!(state.store.is_empty());
    }

    #[test]
    fn invalid_chunking_is_an_initialization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut settings = Settings::default();
        settings.chunking.window_size = 10;
        settings.chunking.overlap = 10;
        let paths = Arc::new(AppPaths::with_dirs(dir.path().to_path_buf(), dir.path().to_path_buf()));
        let result = AppState::from_parts(
            paths,
            settings,
            Arc::new(HashingEmbedder::new(8)),
            Arc::new(EchoBackend::new()),
        );
        assert!(matches!(result, Err(InitializationError::Chunking(_))));
    }

    #[test]
    fn initialize_selects_ollama_without_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = Arc::new(AppPaths::with_dirs(dir.path().to_path_buf(), dir.path().to_path_buf()));
        let state = AppState::initialize(paths, Settings::default()).expect("state should build");
        assert_eq!(state.embedding_backend, "ollama");
        assert_eq!(state.generation_backend, "ollama");
    }

    #[test]
    fn initialize_selects_huggingface_with_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = Arc::new(AppPaths::with_dirs(dir.path().to_path_buf(), dir.path().to_path_buf()));
        let settings = Settings {
            huggingface_token: Some("hf_test".to_string()),
            ..Settings::default()
        };
        let state = AppState::initialize(paths, settings).expect("state should build");
        assert_eq!(state.embedding_backend, "huggingface");
        assert_eq!(state.generation_backend, "huggingface");
    }

    #[tokio::test]
    async fn bootstrap_ingests_configured_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(&docs).expect("create docs dir");
        std::fs::write(docs.join("intro.txt"), "Rust has no garbage collector.").expect("write");

        let mut settings = Settings::default();
        settings.ingestion.bootstrap_dir = Some(docs.clone());
        let state = state_with(settings, dir.path());

        assert_eq!(state.bootstrap_dir(), docs);
        let reports = state.bootstrap().await;
        assert_eq!(reports.len(), 1);
        assert_eq!(state.store.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_policy_is_applied_from_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut settings = Settings::default();
        settings.ingestion.duplicate_policy = DuplicatePolicy::Reject;
        let state = state_with(settings, dir.path());

        state.ingestion.ingest("a", "text").await.expect("first ingest");
        let err = state.ingestion.ingest("a", "text").await.expect_err("duplicate");
        assert!(matches!(err, IngestError::DuplicateSource(_)));
    }
}
