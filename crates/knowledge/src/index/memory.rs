//! In-memory vector index with exhaustive search.

use crate::index::{squared_l2, MetadataFilter, VectorIndex};
use crate::types::{IndexedEntry, ScoredPassage};
use policyqa_core::{AppError, AppResult};
use tokio::sync::RwLock;

/// Brute-force index held in process memory. Contents do not survive restarts.
#[derive(Debug)]
pub struct MemoryIndex {
    dimensions: usize,
    entries: RwLock<Vec<IndexedEntry>>,
}

impl MemoryIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: RwLock::new(Vec::new()),
        }
    }

    fn check_dimensions(&self, len: usize) -> AppResult<()> {
        if len != self.dimensions {
            return Err(AppError::IndexUnavailable(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions, len
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl VectorIndex for MemoryIndex {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn insert(&self, entries: &[IndexedEntry]) -> AppResult<()> {
        for entry in entries {
            self.check_dimensions(entry.embedding.len())?;
        }
        self.entries.write().await.extend_from_slice(entries);
        Ok(())
    }

    async fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> AppResult<Vec<ScoredPassage>> {
        self.check_dimensions(embedding.len())?;

        let entries = self.entries.read().await;
        let mut scored: Vec<ScoredPassage> = entries
            .iter()
            .filter(|entry| filter.map_or(true, |f| f.matches(&entry.passage.metadata)))
            .map(|entry| ScoredPassage {
                passage: entry.passage.clone(),
                distance: squared_l2(embedding, &entry.embedding),
            })
            .collect();

        // Stable sort keeps insertion order among equal distances.
        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);

        Ok(scored)
    }

    async fn reset(&self) -> AppResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Department, Passage, PassageMetadata};

    fn entry(department: &str, source: &str, embedding: Vec<f32>) -> IndexedEntry {
        let metadata = PassageMetadata {
            department: Department::new(department),
            document_type: "politica".to_string(),
            version: "1.0".to_string(),
            source_name: source.to_string(),
            page_number: 0,
        };
        IndexedEntry {
            passage: Passage::new(format!("texto de {}", source), metadata, 0),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_search_orders_by_distance() {
        let index = MemoryIndex::new(2);
        index
            .insert(&[
                entry("RH", "far.pdf", vec![5.0, 5.0]),
                entry("RH", "near.pdf", vec![1.0, 0.0]),
                entry("RH", "mid.pdf", vec![2.0, 0.0]),
            ])
            .await
            .unwrap();

        let results = index.search(&[0.0, 0.0], 2, None).await.unwrap();
        let names: Vec<&str> = results
            .iter()
            .map(|r| r.passage.metadata.source_name.as_str())
            .collect();
        assert_eq!(names, vec!["near.pdf", "mid.pdf"]);
        assert_eq!(results[0].distance, 1.0);
        assert_eq!(results[1].distance, 4.0);
    }

    #[tokio::test]
    async fn test_filter_restricts_candidates() {
        let index = MemoryIndex::new(2);
        index
            .insert(&[
                entry("RH", "ferias.pdf", vec![0.0, 0.1]),
                entry("TI", "vpn.pdf", vec![3.0, 3.0]),
            ])
            .await
            .unwrap();

        let filter = MetadataFilter::department(Department::new("TI"));
        let results = index.search(&[0.0, 0.0], 10, Some(&filter)).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].passage.metadata.source_name, "vpn.pdf");
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing() {
        let index = MemoryIndex::new(2);
        assert!(index.search(&[0.0, 0.0], 5, None).await.unwrap().is_empty());
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset_and_dimension_check() {
        let index = MemoryIndex::new(2);
        index.insert(&[entry("RH", "a.pdf", vec![0.0, 1.0])]).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 1);

        assert!(matches!(
            index.insert(&[entry("RH", "b.pdf", vec![0.0])]).await,
            Err(AppError::IndexUnavailable(_))
        ));

        index.reset().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
