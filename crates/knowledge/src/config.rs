//! Retrieval pipeline configuration.
//!
//! Loaded from `.policyqa/rag.yaml` when present; every field has a default,
//! so a missing file or a partial file both work.

use crate::chunker::ChunkingConfig;
use crate::classifier::{default_departments, DepartmentKeywords};
use crate::embeddings::EmbeddingConfig;
use crate::generator::GenerationConfig;
use crate::loader::DocumentSpec;
use crate::retriever::RetrievalConfig;
use crate::store::PopulateMode;
use policyqa_core::{config::STATE_DIR, AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the pipeline config inside the state directory.
pub const RAG_CONFIG_FILE: &str = "rag.yaml";

/// Storage backend for the vector index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    #[default]
    Lancedb,
    Memory,
}

/// Index settings (`index` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
    #[serde(default)]
    pub backend: IndexBackend,

    /// Database directory, relative to the workspace unless absolute
    #[serde(default = "default_index_path")]
    pub path: PathBuf,

    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default)]
    pub mode: PopulateMode,
}

fn default_index_path() -> PathBuf {
    PathBuf::from(STATE_DIR).join("index")
}

fn default_table() -> String {
    "passages".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::default(),
            path: default_index_path(),
            table: default_table(),
            mode: PopulateMode::default(),
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagConfig {
    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    /// Routing table; list order is priority order
    #[serde(default = "default_departments")]
    pub departments: Vec<DepartmentKeywords>,

    /// Explicit document manifest
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<DocumentSpec>,

    /// Directory laid out as `<DEPARTMENT>/<file>`, used when `documents` is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_dir: Option<PathBuf>,

    /// Populate the index before answering
    #[serde(default = "default_ingest_on_startup")]
    pub ingest_on_startup: bool,
}

fn default_ingest_on_startup() -> bool {
    true
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            departments: default_departments(),
            documents: Vec::new(),
            documents_dir: None,
            ingest_on_startup: default_ingest_on_startup(),
        }
    }
}

impl RagConfig {
    /// Load `rag.yaml` from the workspace state directory, or defaults.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        let path = config_path(workspace);

        let config = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                AppError::Config(format!("Failed to read config at {:?}: {}", path, e))
            })?;
            let config: RagConfig = serde_yaml::from_str(&content).map_err(|e| {
                AppError::Config(format!("Failed to parse config at {:?}: {}", path, e))
            })?;
            tracing::debug!("Loaded pipeline config from {:?}", path);
            config
        } else {
            tracing::debug!("No {} found, using defaults", RAG_CONFIG_FILE);
            RagConfig::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Write the config to `rag.yaml`, creating the state directory.
    pub fn save(&self, workspace: &Path) -> AppResult<()> {
        let path = config_path(workspace);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(&path, yaml)?;

        tracing::debug!("Saved pipeline config to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        self.chunking.validate()?;
        self.embedding.validate()?;
        self.retrieval.validate()?;
        self.generation.validate()?;

        if self.index.table.trim().is_empty() {
            return Err(AppError::Config("index.table must not be empty".to_string()));
        }
        Ok(())
    }

    /// Absolute index directory for a workspace.
    pub fn index_path(&self, workspace: &Path) -> PathBuf {
        resolve(workspace, &self.index.path)
    }

    /// Absolute documents directory, if configured.
    pub fn documents_dir(&self, workspace: &Path) -> Option<PathBuf> {
        self.documents_dir.as_ref().map(|dir| resolve(workspace, dir))
    }
}

/// Path of `rag.yaml` for a workspace.
pub fn config_path(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join(RAG_CONFIG_FILE)
}

pub(crate) fn resolve(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = RagConfig::load(temp.path()).unwrap();

        assert_eq!(config, RagConfig::default());
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.retrieval.max_distance, Some(1.5));
        assert_eq!(config.index.backend, IndexBackend::Lancedb);
        assert_eq!(config.index.mode, PopulateMode::AppendIfEmpty);
        assert_eq!(config.departments[0].department.as_str(), "RH");
        assert!(config.ingest_on_startup);
        assert_eq!(
            config.index_path(temp.path()),
            temp.path().join(".policyqa").join("index")
        );
    }

    #[test]
    fn test_partial_yaml() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".policyqa")).unwrap();
        fs::write(
            config_path(temp.path()),
            r#"
chunking:
  chunkSize: 300
index:
  backend: memory
  mode: rebuild
retrieval:
  maxDistance: null
departments:
  - department: fin
    keywords: [reembolso]
documents:
  - path: docs/FIN/politica_reembolso.pdf
    department: fin
    documentType: politica
documentsDir: /srv/docs
"#,
        )
        .unwrap();

        let config = RagConfig::load(temp.path()).unwrap();
        assert_eq!(config.chunking.chunk_size, 300);
        assert_eq!(config.chunking.chunk_overlap, 80);
        assert_eq!(config.index.backend, IndexBackend::Memory);
        assert_eq!(config.index.mode, PopulateMode::Rebuild);
        assert_eq!(config.index.table, "passages");
        assert_eq!(config.retrieval.max_distance, None);
        assert_eq!(config.departments.len(), 1);
        assert_eq!(config.documents[0].department.as_str(), "FIN");
        assert_eq!(config.documents[0].version, "1.0");
        assert_eq!(
            config.documents_dir(temp.path()),
            Some(PathBuf::from("/srv/docs"))
        );
    }

    #[test]
    fn test_invalid_chunking_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".policyqa")).unwrap();
        fs::write(
            config_path(temp.path()),
            "chunking:\n  chunkSize: 50\n  chunkOverlap: 50\n",
        )
        .unwrap();

        assert!(matches!(
            RagConfig::load(temp.path()),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let mut config = RagConfig::default();
        config.retrieval.final_count = 5;
        config.index.backend = IndexBackend::Memory;

        config.save(temp.path()).unwrap();

        let loaded = RagConfig::load(temp.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
