//! Text chunking with configurable size and overlap.

use crate::types::{Passage, SourceDocument};
use policyqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Chunk window settings, measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    80
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be greater than 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split pages into overlapping passages.
///
/// Windows never cross page boundaries. Every window but the last spans
/// exactly `chunk_size` chars and starts `chunk_size - chunk_overlap` chars
/// after the previous one; the last window ends at the page end. Text is
/// kept verbatim so adjacent passages share exactly `chunk_overlap` chars.
/// Blank pages yield nothing.
pub fn chunk_documents(
    documents: &[SourceDocument],
    config: &ChunkingConfig,
) -> AppResult<Vec<Passage>> {
    config.validate()?;

    let passages: Vec<Passage> = documents
        .iter()
        .filter(|doc| !doc.text.trim().is_empty())
        .flat_map(|doc| {
            char_windows(&doc.text, config.chunk_size, config.chunk_overlap)
                .into_iter()
                .map(move |(start, text)| Passage::new(text, doc.metadata.clone(), start))
        })
        .collect();

    tracing::debug!(
        "Chunked {} pages into {} passages (size: {}, overlap: {})",
        documents.len(),
        passages.len(),
        config.chunk_size,
        config.chunk_overlap
    );

    Ok(passages)
}

/// Char-indexed windows as `(start_char, slice)` pairs.
fn char_windows(text: &str, size: usize, overlap: usize) -> Vec<(usize, &str)> {
    // Byte offset of every char boundary, including the end of the text.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = bounds.len() - 1;
    let step = size - overlap;

    let mut windows = Vec::new();
    let mut start = 0;

    while start < char_len {
        let end = (start + size).min(char_len);
        windows.push((start, &text[bounds[start]..bounds[end]]));

        if end == char_len {
            break;
        }
        start += step;
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Department, PassageMetadata};

    fn page(text: &str, page_number: u32) -> SourceDocument {
        SourceDocument {
            text: text.to_string(),
            metadata: PassageMetadata {
                department: Department::new("RH"),
                document_type: "politica".to_string(),
                version: "1.0".to_string(),
                source_name: "politica_ferias.pdf".to_string(),
                page_number,
            },
        }
    }

    fn numbered_text(len: usize) -> String {
        (0..len)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect()
    }

    #[test]
    fn test_1200_chars_default_config() {
        let text = numbered_text(1200);
        let passages = chunk_documents(&[page(&text, 0)], &ChunkingConfig::default()).unwrap();

        assert_eq!(passages.len(), 3);
        for passage in &passages {
            assert!(passage.text.chars().count() <= 500);
        }
        assert_eq!(passages[0].text, text[0..500]);
        assert_eq!(passages[1].text, text[420..920]);
        assert_eq!(passages[2].text, text[840..1200]);

        for pair in passages.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let tail: String = prev[prev.len() - 80..].iter().collect();
            let head: String = pair[1].text.chars().take(80).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_windows_cover_full_text() {
        let text = numbered_text(1234);
        let windows = char_windows(&text, 100, 30);

        let mut rebuilt = windows[0].1.to_string();
        for (start, slice) in windows.iter().skip(1) {
            let prev_end = rebuilt.chars().count();
            let skip = prev_end - start;
            rebuilt.extend(slice.chars().skip(skip));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_short_page_is_single_passage() {
        let passages =
            chunk_documents(&[page("Férias de 30 dias.", 0)], &ChunkingConfig::default()).unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].text, "Férias de 30 dias.");
    }

    #[test]
    fn test_exact_size_page_is_single_passage() {
        let text = numbered_text(500);
        let passages = chunk_documents(&[page(&text, 0)], &ChunkingConfig::default()).unwrap();
        assert_eq!(passages.len(), 1);
    }

    #[test]
    fn test_multibyte_text_counts_chars() {
        let text = "ção".repeat(200);
        let config = ChunkingConfig::new(100, 10).unwrap();
        let passages = chunk_documents(&[page(&text, 0)], &config).unwrap();

        assert!(passages.iter().all(|p| p.text.chars().count() <= 100));
        assert_eq!(passages[0].text.chars().count(), 100);
    }

    #[test]
    fn test_metadata_copied_and_pages_kept_apart() {
        let docs = vec![page(&numbered_text(600), 0), page("   \n", 1), page("fim", 2)];
        let passages = chunk_documents(&docs, &ChunkingConfig::default()).unwrap();

        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].metadata, docs[0].metadata);
        assert_eq!(passages[1].metadata.page_number, 0);
        assert_eq!(passages[2].metadata.page_number, 2);
        assert_eq!(passages[2].text, "fim");
    }

    #[test]
    fn test_invalid_config() {
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(100, 100).is_err());
        assert!(ChunkingConfig::new(100, 99).is_ok());

        let bad = ChunkingConfig {
            chunk_size: 50,
            chunk_overlap: 80,
        };
        assert!(chunk_documents(&[page("texto", 0)], &bad).is_err());
    }
}
