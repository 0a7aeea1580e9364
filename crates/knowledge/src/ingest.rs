//! Ingestion: resolve the document set, load, chunk and populate the store.

use crate::chunker::{chunk_documents, ChunkingConfig};
use crate::config::{resolve, RagConfig};
use crate::loader::{default_version, load_document, ContentType, DocumentSpec, PageExtractor};
use crate::store::{IndexStore, PopulateMode, PopulateStats};
use crate::types::{Department, Passage};
use chrono::{DateTime, Utc};
use policyqa_core::{AppError, AppResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

/// Root of the bundled corpus, relative to the workspace.
pub const DEFAULT_DOCUMENTS_DIR: &str = "documentos_empresa";

/// The stock policy corpus.
pub fn default_manifest(workspace: &Path) -> Vec<DocumentSpec> {
    let root = workspace.join(DEFAULT_DOCUMENTS_DIR);
    vec![
        DocumentSpec::new(root.join("RH/politica_ferias.pdf"), "RH", "politica", "1.0"),
        DocumentSpec::new(root.join("RH/politica_home_office.pdf"), "RH", "politica", "1.0"),
        DocumentSpec::new(root.join("TI/procedimento_vpn.pdf"), "TI", "procedimento", "1.0"),
        DocumentSpec::new(
            root.join("TI/politica_seguranca_informacao.pdf"),
            "TI",
            "politica",
            "1.0",
        ),
    ]
}

/// Documents to ingest: the explicit manifest, else `documentsDir`, else the stock corpus.
pub fn resolve_documents(config: &RagConfig, workspace: &Path) -> AppResult<Vec<DocumentSpec>> {
    if !config.documents.is_empty() {
        return Ok(config
            .documents
            .iter()
            .map(|spec| DocumentSpec {
                path: resolve(workspace, &spec.path),
                ..spec.clone()
            })
            .collect());
    }

    if let Some(dir) = config.documents_dir(workspace) {
        return discover_documents(&dir);
    }

    Ok(default_manifest(workspace))
}

/// Find documents laid out as `<dir>/<DEPARTMENT>/<file>`.
///
/// The department is the parent directory name; the document type is the
/// file stem up to the first `_`. Unsupported file types are skipped.
pub fn discover_documents(dir: &Path) -> AppResult<Vec<DocumentSpec>> {
    if !dir.is_dir() {
        return Err(AppError::Config(format!(
            "Documents directory does not exist: {:?}",
            dir
        )));
    }

    let mut specs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(2)
        .max_depth(2)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || ContentType::from_path(path) == ContentType::Unknown {
            continue;
        }

        let department = match path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
        {
            Some(name) => Department::new(name),
            None => continue,
        };

        let document_type = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|stem| stem.split('_').next())
            .unwrap_or_default()
            .to_lowercase();

        specs.push(DocumentSpec {
            path: path.to_path_buf(),
            department,
            document_type,
            version: default_version(),
        });
    }

    tracing::debug!("Discovered {} documents under {:?}", specs.len(), dir);
    Ok(specs)
}

/// A document that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub started_at: DateTime<Utc>,
    pub documents: usize,
    pub pages: usize,
    pub passages: usize,
    pub failures: Vec<IngestFailure>,
    /// `None` when nothing was written
    pub populate: Option<PopulateStats>,
    pub duration_secs: f64,
}

impl IngestReport {
    /// Every requested document failed to load.
    pub fn all_failed(&self) -> bool {
        self.documents == 0 && !self.failures.is_empty()
    }
}

/// Load and chunk every document; failures are collected, not fatal.
pub async fn load_passages(
    extractor: Arc<dyn PageExtractor>,
    specs: &[DocumentSpec],
    chunking: &ChunkingConfig,
) -> AppResult<(Vec<Passage>, IngestReport)> {
    let started_at = Utc::now();
    let start = Instant::now();

    let mut report = IngestReport {
        started_at,
        documents: 0,
        pages: 0,
        passages: 0,
        failures: Vec::new(),
        populate: None,
        duration_secs: 0.0,
    };
    let mut passages = Vec::new();

    for spec in specs {
        let extractor = Arc::clone(&extractor);
        let owned = spec.clone();
        let loaded = tokio::task::spawn_blocking(move || load_document(extractor.as_ref(), &owned))
            .await
            .map_err(|e| AppError::Other(format!("Document loader task failed: {}", e)))?;

        let pages = match loaded {
            Ok(pages) => pages,
            Err(e) => {
                tracing::error!("Skipping {:?}: {}", spec.path, e);
                report.failures.push(IngestFailure {
                    path: spec.path.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let chunks = chunk_documents(&pages, chunking)?;
        tracing::info!(
            "Loaded {} ({} pages, {} passages)",
            spec.source_name(),
            pages.len(),
            chunks.len()
        );

        report.documents += 1;
        report.pages += pages.len();
        report.passages += chunks.len();
        passages.extend(chunks);
    }

    report.duration_secs = start.elapsed().as_secs_f64();
    Ok((passages, report))
}

/// Load, chunk and store documents.
///
/// In append-if-empty mode a populated store is left untouched without
/// reading any document. Nothing is written when no passage was produced,
/// so a failed run never wipes a previous index.
pub async fn ingest_documents(
    store: &IndexStore,
    extractor: Arc<dyn PageExtractor>,
    specs: &[DocumentSpec],
    chunking: &ChunkingConfig,
    mode: PopulateMode,
) -> AppResult<IngestReport> {
    let start = Instant::now();

    if mode == PopulateMode::AppendIfEmpty {
        let existing = store.count().await?;
        if existing > 0 {
            tracing::info!("Index already holds {} entries, skipping ingestion", existing);
            return Ok(IngestReport {
                started_at: Utc::now(),
                documents: 0,
                pages: 0,
                passages: 0,
                failures: Vec::new(),
                populate: Some(PopulateStats {
                    inserted: 0,
                    skipped: true,
                    total: existing,
                }),
                duration_secs: start.elapsed().as_secs_f64(),
            });
        }
    }

    tracing::info!("Ingesting {} documents ({})", specs.len(), mode);

    let (passages, mut report) = load_passages(extractor, specs, chunking).await?;

    if passages.is_empty() {
        tracing::warn!("No passages produced, index left unchanged");
    } else {
        report.populate = Some(store.populate_with_mode(&passages, mode).await?);
    }

    report.duration_secs = start.elapsed().as_secs_f64();
    tracing::info!(
        "Ingestion completed: {} documents, {} passages, {} failures in {:.2}s",
        report.documents,
        report.passages,
        report.failures.len(),
        report.duration_secs
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::index::MemoryIndex;
    use crate::loader::FileExtractor;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn store(mode: PopulateMode) -> IndexStore {
        IndexStore::new(
            Arc::new(MemoryIndex::new(128)),
            Arc::new(TrigramProvider::new(128)),
            mode,
        )
    }

    #[test]
    fn test_discover_documents() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "ti/procedimento_vpn.txt", "vpn");
        write(temp.path(), "RH/politica_ferias.md", "férias");
        write(temp.path(), "RH/planilha.xlsx", "ignorado");
        write(temp.path(), "leiame.txt", "fora de departamento");

        let specs = discover_documents(temp.path()).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].department.as_str(), "RH");
        assert_eq!(specs[0].document_type, "politica");
        assert_eq!(specs[1].department.as_str(), "TI");
        assert_eq!(specs[1].document_type, "procedimento");
        assert_eq!(specs[1].version, "1.0");
    }

    #[test]
    fn test_resolve_documents_precedence() {
        let temp = TempDir::new().unwrap();
        let mut config = RagConfig::default();

        let defaults = resolve_documents(&config, temp.path()).unwrap();
        assert_eq!(defaults.len(), 4);
        assert!(defaults[2].path.ends_with("documentos_empresa/TI/procedimento_vpn.pdf"));

        write(temp.path(), "docs/TI/procedimento_vpn.txt", "vpn");
        config.documents_dir = Some(PathBuf::from("docs"));
        assert_eq!(resolve_documents(&config, temp.path()).unwrap().len(), 1);

        config.documents = vec![DocumentSpec::new("a/politica.txt", "RH", "politica", "2.0")];
        let explicit = resolve_documents(&config, temp.path()).unwrap();
        assert_eq!(explicit.len(), 1);
        assert_eq!(explicit[0].path, temp.path().join("a/politica.txt"));
    }

    #[tokio::test]
    async fn test_failures_are_reported() {
        let temp = TempDir::new().unwrap();
        let good = write(temp.path(), "TI/procedimento_vpn.txt", "Instale o cliente VPN.");
        let specs = vec![
            DocumentSpec::new(&good, "TI", "procedimento", "1.0"),
            DocumentSpec::new(temp.path().join("RH/ausente.pdf"), "RH", "politica", "1.0"),
        ];

        let store = store(PopulateMode::AppendIfEmpty);
        let report = ingest_documents(
            &store,
            Arc::new(FileExtractor),
            &specs,
            &ChunkingConfig::default(),
            PopulateMode::AppendIfEmpty,
        )
        .await
        .unwrap();

        assert_eq!(report.documents, 1);
        assert_eq!(report.passages, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("ausente.pdf"));
        assert!(!report.all_failed());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_all_failed_leaves_index_alone() {
        let temp = TempDir::new().unwrap();
        let good = write(temp.path(), "TI/procedimento_vpn.txt", "Instale o cliente VPN.");
        let store = store(PopulateMode::Rebuild);

        ingest_documents(
            &store,
            Arc::new(FileExtractor),
            &[DocumentSpec::new(&good, "TI", "procedimento", "1.0")],
            &ChunkingConfig::default(),
            PopulateMode::Rebuild,
        )
        .await
        .unwrap();

        let report = ingest_documents(
            &store,
            Arc::new(FileExtractor),
            &[DocumentSpec::new(temp.path().join("x.pdf"), "TI", "politica", "1.0")],
            &ChunkingConfig::default(),
            PopulateMode::Rebuild,
        )
        .await
        .unwrap();

        assert!(report.all_failed());
        assert!(report.populate.is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_append_if_empty_skips_loading() {
        let temp = TempDir::new().unwrap();
        let path = write(temp.path(), "RH/politica_ferias.txt", "Férias de trinta dias.");
        let specs = vec![DocumentSpec::new(&path, "RH", "politica", "1.0")];
        let store = store(PopulateMode::AppendIfEmpty);

        for _ in 0..2 {
            ingest_documents(
                &store,
                Arc::new(FileExtractor),
                &specs,
                &ChunkingConfig::default(),
                PopulateMode::AppendIfEmpty,
            )
            .await
            .unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 1);
    }
}
