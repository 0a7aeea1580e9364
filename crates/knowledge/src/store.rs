//! Index store: embeds passages into a vector index and answers similarity queries.

use crate::embeddings::EmbeddingProvider;
use crate::index::{MetadataFilter, VectorIndex};
use crate::types::{IndexedEntry, Passage, ScoredPassage};
use policyqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// What `populate` does when the store already holds entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PopulateMode {
    /// Embed everything, then replace the stored entries.
    Rebuild,
    /// Load only into an empty store; otherwise do nothing.
    #[default]
    AppendIfEmpty,
}

impl fmt::Display for PopulateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopulateMode::Rebuild => f.write_str("rebuild"),
            PopulateMode::AppendIfEmpty => f.write_str("append-if-empty"),
        }
    }
}

/// Outcome of a `populate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulateStats {
    /// Entries written by this call
    pub inserted: usize,
    /// Whether the call was a no-op on a non-empty store
    pub skipped: bool,
    /// Entries in the store afterwards
    pub total: usize,
}

/// Shared store of embedded passages.
///
/// `populate` and `clear` run in an exclusive phase; `query` and `count`
/// share the lock and may run concurrently with each other.
pub struct IndexStore {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    mode: PopulateMode,
    batch_size: usize,
    phase: RwLock<()>,
}

impl IndexStore {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        mode: PopulateMode,
    ) -> Self {
        Self {
            index,
            embedder,
            mode,
            batch_size: 32,
            phase: RwLock::new(()),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn mode(&self) -> PopulateMode {
        self.mode
    }

    pub fn backend_name(&self) -> &str {
        self.index.backend_name()
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Embed and store passages according to the configured mode.
    pub async fn populate(&self, passages: &[Passage]) -> AppResult<PopulateStats> {
        self.populate_with_mode(passages, self.mode).await
    }

    /// Embed and store passages with an explicit mode.
    pub async fn populate_with_mode(
        &self,
        passages: &[Passage],
        mode: PopulateMode,
    ) -> AppResult<PopulateStats> {
        let _guard = self.phase.write().await;

        let existing = self.index.count().await?;
        if mode == PopulateMode::AppendIfEmpty && existing > 0 {
            tracing::info!(
                "Index already holds {} entries, skipping population ({})",
                existing,
                mode
            );
            return Ok(PopulateStats {
                inserted: 0,
                skipped: true,
                total: existing,
            });
        }

        tracing::info!(
            "Embedding {} passages with '{}' (model: {})",
            passages.len(),
            self.embedder.provider_name(),
            self.embedder.model_name()
        );

        // Nothing is written until every passage is embedded.
        let mut entries = Vec::with_capacity(passages.len());
        for batch in passages.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();
            let embeddings = self.embed(&texts).await?;

            entries.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(embeddings)
                    .map(|(passage, embedding)| IndexedEntry { passage, embedding }),
            );
            tracing::debug!("Embedded {}/{} passages", entries.len(), passages.len());
        }

        if mode == PopulateMode::Rebuild && existing > 0 {
            tracing::info!("Rebuilding index, dropping {} entries", existing);
            self.index.reset().await?;
        }

        let mut inserted = 0;
        for batch in entries.chunks(self.batch_size) {
            self.index.insert(batch).await?;
            inserted += batch.len();
        }
        tracing::debug!("Stored {} passages", inserted);

        let total = self.index.count().await?;
        Ok(PopulateStats {
            inserted,
            skipped: false,
            total,
        })
    }

    /// Up to `k` passages nearest to `text`, ascending by distance.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> AppResult<Vec<ScoredPassage>> {
        let embedding = self.embedder.embed(text).await.map_err(into_embedding_error)?;

        let _guard = self.phase.read().await;
        self.index.search(&embedding, k, filter).await
    }

    pub async fn count(&self) -> AppResult<usize> {
        let _guard = self.phase.read().await;
        self.index.count().await
    }

    /// Remove every entry.
    pub async fn clear(&self) -> AppResult<()> {
        let _guard = self.phase.write().await;
        self.index.reset().await
    }

    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let embeddings = self
            .embedder
            .embed_batch(texts)
            .await
            .map_err(into_embedding_error)?;

        if embeddings.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }
}

fn into_embedding_error(err: AppError) -> AppError {
    match err {
        AppError::Embedding(_) => err,
        other => AppError::Embedding(other.to_string()),
    }
}
