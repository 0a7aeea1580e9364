//! Document loading and page-level text extraction.

use crate::types::{Department, PassageMetadata, SourceDocument};
use policyqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Page separator in plain text and markdown files.
const PAGE_BREAK: char = '\x0C';

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Pdf,
    Markdown,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("md") | Some("markdown") => Self::Markdown,
            Some("txt") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// A document to ingest together with its departmental metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSpec {
    pub path: PathBuf,
    pub department: Department,
    pub document_type: String,
    #[serde(default = "default_version")]
    pub version: String,
}

pub(crate) fn default_version() -> String {
    "1.0".to_string()
}

impl DocumentSpec {
    pub fn new(
        path: impl Into<PathBuf>,
        department: impl Into<Department>,
        document_type: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            department: department.into(),
            document_type: document_type.into(),
            version: version.into(),
        }
    }

    /// Final path segment, used as the citation source name.
    pub fn source_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Text extraction capability: file path in, page texts out, in page order.
pub trait PageExtractor: Send + Sync {
    fn extract_pages(&self, path: &Path) -> AppResult<Vec<String>>;
}

/// Extracts by file extension: PDF through `pdf-extract`, text and markdown as-is.
///
/// PDFs keep their own page structure; text files split on form feeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileExtractor;

impl PageExtractor for FileExtractor {
    fn extract_pages(&self, path: &Path) -> AppResult<Vec<String>> {
        let content_type = ContentType::from_path(path);
        tracing::debug!("Extracting {} pages from {:?}", content_type.as_str(), path);

        match content_type {
            ContentType::Pdf => {
                let bytes = fs::read(path).map_err(|e| AppError::load(path, e.to_string()))?;
                pdf_extract::extract_text_from_mem_by_pages(&bytes)
                    .map_err(|e| AppError::load(path, format!("PDF extraction failed: {}", e)))
            }
            ContentType::Markdown | ContentType::PlainText => {
                let text =
                    fs::read_to_string(path).map_err(|e| AppError::load(path, e.to_string()))?;
                Ok(split_pages(&text))
            }
            ContentType::Unknown => Err(AppError::load(
                path,
                format!("unsupported file type ({})", content_type.as_str()),
            )),
        }
    }
}

/// Split extracted text on page breaks.
///
/// A single trailing break does not open an extra page.
fn split_pages(text: &str) -> Vec<String> {
    let text = text.strip_suffix(PAGE_BREAK).unwrap_or(text);
    text.split(PAGE_BREAK).map(str::to_string).collect()
}

/// Load a document into one [`SourceDocument`] per page, in page order.
pub fn load_document(
    extractor: &dyn PageExtractor,
    spec: &DocumentSpec,
) -> AppResult<Vec<SourceDocument>> {
    tracing::debug!("Loading document: {:?}", spec.path);

    let pages = extractor.extract_pages(&spec.path)?;
    let source_name = spec.source_name();

    let documents: Vec<SourceDocument> = pages
        .into_iter()
        .enumerate()
        .map(|(page_number, text)| SourceDocument {
            text,
            metadata: PassageMetadata {
                department: spec.department.clone(),
                document_type: spec.document_type.clone(),
                version: spec.version.clone(),
                source_name: source_name.clone(),
                page_number: page_number as u32,
            },
        })
        .collect();

    tracing::debug!("Loaded {} pages from {}", documents.len(), source_name);

    Ok(documents)
}
