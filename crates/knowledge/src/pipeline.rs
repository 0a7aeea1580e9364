//! Question answering pipeline: classify, retrieve, assemble, generate.

use crate::chunker::ChunkingConfig;
use crate::classifier::DepartmentClassifier;
use crate::config::{IndexBackend, RagConfig};
use crate::context::assemble;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::generator::GroundedGenerator;
use crate::index::{LanceDbIndex, MemoryIndex, VectorIndex};
use crate::ingest::{ingest_documents, resolve_documents, IngestReport};
use crate::loader::{FileExtractor, PageExtractor};
use crate::retriever::{Retrieval, RetrievalConfig, Retriever};
use crate::store::{IndexStore, PopulateMode};
use crate::types::{AnswerResult, Department};
use policyqa_core::{AppConfig, AppError, AppResult};
use policyqa_llm::{create_client, LlmClient};
use policyqa_prompt::{load_prompt, DEFAULT_PROMPT_ID};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Open the configured index backend and wrap it in a store.
pub async fn open_store(workspace: &Path, config: &RagConfig) -> AppResult<IndexStore> {
    let embedder = create_provider(&config.embedding)?;
    let index = open_index(workspace, config, embedder.as_ref()).await?;

    Ok(IndexStore::new(index, embedder, config.index.mode)
        .with_batch_size(config.embedding.batch_size))
}

async fn open_index(
    workspace: &Path,
    config: &RagConfig,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<Arc<dyn VectorIndex>> {
    let dimensions = embedder.dimensions();

    match config.index.backend {
        IndexBackend::Memory => Ok(Arc::new(MemoryIndex::new(dimensions))),
        IndexBackend::Lancedb => {
            let path = config.index_path(workspace);
            let index = LanceDbIndex::open(&path, &config.index.table, dimensions).await?;
            Ok(Arc::new(index))
        }
    }
}

/// Generative client for the active provider.
pub fn create_llm_client(app: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let endpoint = app
        .get_provider_config(&app.provider)
        .and_then(|provider| provider.endpoint());
    let api_key = app.resolve_api_key(&app.provider);

    create_client(&app.provider, endpoint, api_key.as_deref())
        .map_err(|e| AppError::Config(format!("Failed to create LLM client: {}", e)))
}

/// Shared, read-mostly answering pipeline.
///
/// `answer` takes `&self` and may run concurrently; ingestion goes through
/// the store's exclusive phase.
pub struct RagPipeline {
    workspace: PathBuf,
    store: Arc<IndexStore>,
    classifier: Arc<DepartmentClassifier>,
    retriever: Retriever,
    generator: GroundedGenerator,
    extractor: Arc<dyn PageExtractor>,
    chunking: ChunkingConfig,
    config: Arc<RagConfig>,
}

impl RagPipeline {
    /// Assemble a pipeline from pre-built parts.
    pub fn new(
        workspace: impl Into<PathBuf>,
        store: Arc<IndexStore>,
        generator: GroundedGenerator,
        config: RagConfig,
    ) -> Self {
        let classifier = Arc::new(DepartmentClassifier::new(config.departments.clone()));
        let retriever = Retriever::new(Arc::clone(&store), Arc::clone(&classifier), config.retrieval);

        Self {
            workspace: workspace.into(),
            store,
            classifier,
            retriever,
            generator,
            extractor: Arc::new(FileExtractor),
            chunking: config.chunking,
            config: Arc::new(config),
        }
    }

    /// Build every component from the application and pipeline configs.
    pub async fn from_config(app: &AppConfig, config: RagConfig) -> AppResult<Self> {
        config.validate()?;

        let store = Arc::new(open_store(&app.workspace, &config).await?);

        let prompt_id = config
            .generation
            .prompt_id
            .as_deref()
            .unwrap_or(DEFAULT_PROMPT_ID);
        let prompt = load_prompt(&app.workspace, prompt_id)?;

        let model = config
            .generation
            .model
            .clone()
            .unwrap_or_else(|| app.model.clone());
        let generator =
            GroundedGenerator::new(create_llm_client(app)?, prompt, model, &config.generation);

        tracing::info!(
            "Pipeline ready (index: {}, embeddings: {}/{}, generation: {}/{})",
            store.backend_name(),
            store.embedder().provider_name(),
            store.embedder().model_name(),
            app.provider,
            generator.model()
        );

        Ok(Self::new(app.workspace.clone(), store, generator, config))
    }

    /// Replace the text extraction provider.
    pub fn with_extractor(mut self, extractor: Arc<dyn PageExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn retrieval_config(&self) -> &RetrievalConfig {
        self.retriever.config()
    }

    pub fn classify(&self, query: &str) -> Option<Department> {
        self.classifier.classify(query)
    }

    /// Populate the store when `ingestOnStartup` is set.
    pub async fn bootstrap(&self) -> AppResult<Option<IngestReport>> {
        if !self.config.ingest_on_startup {
            return Ok(None);
        }
        self.ingest(self.store.mode()).await.map(Some)
    }

    /// Load the configured documents into the store.
    pub async fn ingest(&self, mode: PopulateMode) -> AppResult<IngestReport> {
        let specs = resolve_documents(&self.config, &self.workspace)?;
        ingest_documents(
            &self.store,
            Arc::clone(&self.extractor),
            &specs,
            &self.chunking,
            mode,
        )
        .await
    }

    /// Selected passages for a query, without generation.
    pub async fn retrieve(&self, query: &str) -> AppResult<Retrieval> {
        self.retriever.retrieve(query).await
    }

    /// Answer a question from the indexed documents.
    ///
    /// No evidence yields the not-found answer; provider failures are errors.
    pub async fn answer(&self, query: &str) -> AppResult<AnswerResult> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(AnswerResult::not_found());
        }

        tracing::info!("Answering query: {}", query);

        let retrieval = self.retriever.retrieve(query).await?;
        if retrieval.is_empty() {
            tracing::info!("No passages retrieved");
            return Ok(AnswerResult::not_found());
        }

        let context = assemble(&retrieval.into_passages());
        let result = self.generator.generate(query, context).await?;

        tracing::debug!(
            "Answer ready ({} chars, {} citations)",
            result.answer.len(),
            result.citations.len()
        );

        Ok(result)
    }
}
