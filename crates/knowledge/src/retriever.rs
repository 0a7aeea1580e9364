//! Department-aware retrieval with per-source deduplication and a relevance gate.

use crate::classifier::DepartmentClassifier;
use crate::index::MetadataFilter;
use crate::store::IndexStore;
use crate::types::{Department, Passage, ScoredPassage};
use policyqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Retrieval settings (`retrieval` section of `rag.yaml`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Candidates requested from the index
    #[serde(default = "default_candidates")]
    pub candidates: usize,

    /// Passages kept after deduplication
    #[serde(default = "default_final_count")]
    pub final_count: usize,

    /// Distance cutoff; `null` disables the gate. Tied to the embedding
    /// model's distance scale, so retune it when switching providers.
    #[serde(default = "default_max_distance")]
    pub max_distance: Option<f32>,
}

fn default_candidates() -> usize {
    10
}

fn default_final_count() -> usize {
    3
}

fn default_max_distance() -> Option<f32> {
    Some(1.5)
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidates: default_candidates(),
            final_count: default_final_count(),
            max_distance: default_max_distance(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.candidates == 0 || self.final_count == 0 {
            return Err(AppError::Config(
                "retrieval.candidates and retrieval.finalCount must be greater than 0".to_string(),
            ));
        }
        if let Some(max) = self.max_distance {
            if !max.is_finite() || max < 0.0 {
                return Err(AppError::Config(format!(
                    "retrieval.maxDistance must be a non-negative number, got {}",
                    max
                )));
            }
        }
        Ok(())
    }
}

/// Passages selected for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    /// Department the query was routed to, if any
    pub department: Option<Department>,
    /// Selected passages, best first
    pub passages: Vec<ScoredPassage>,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn into_passages(self) -> Vec<Passage> {
        self.passages.into_iter().map(|s| s.passage).collect()
    }
}

pub struct Retriever {
    store: Arc<IndexStore>,
    classifier: Arc<DepartmentClassifier>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        store: Arc<IndexStore>,
        classifier: Arc<DepartmentClassifier>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub async fn retrieve(&self, query: &str) -> AppResult<Retrieval> {
        let department = self.classifier.classify(query);
        let filter = department.clone().map(MetadataFilter::department);

        tracing::debug!(
            "Query routed to department: {}",
            department.as_ref().map_or("none", |d| d.as_str())
        );

        let candidates = self
            .store
            .query(query, self.config.candidates, filter.as_ref())
            .await?;

        tracing::debug!(
            "Retrieved {} candidates, distances: {:?}",
            candidates.len(),
            candidates.iter().map(|c| c.distance).collect::<Vec<_>>()
        );

        let passages = rerank(candidates, &self.config);

        tracing::info!(
            "Selected {} passages (department: {})",
            passages.len(),
            department.as_ref().map_or("none", |d| d.as_str())
        );

        Ok(Retrieval {
            department,
            passages,
        })
    }
}

/// Reduce raw candidates to the final passage list.
///
/// Keeps the closest passage per source (earlier candidate wins a tie),
/// orders by distance, keeps `final_count`, then applies the distance gate.
/// If the gate would drop everything, the single closest candidate is kept.
pub fn rerank(candidates: Vec<ScoredPassage>, config: &RetrievalConfig) -> Vec<ScoredPassage> {
    let mut ranked = dedupe_by_source(candidates);
    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked.truncate(config.final_count);

    let Some(max_distance) = config.max_distance else {
        return ranked;
    };

    let best = match ranked.first() {
        Some(best) => best.clone(),
        None => return ranked,
    };

    ranked.retain(|p| p.distance <= max_distance);
    if ranked.is_empty() {
        tracing::warn!(
            "All candidates above distance {:.3}, keeping best match '{}' ({:.3})",
            max_distance,
            best.passage.metadata.source_name,
            best.distance
        );
        ranked.push(best);
    }

    ranked
}

fn dedupe_by_source(candidates: Vec<ScoredPassage>) -> Vec<ScoredPassage> {
    let mut best: Vec<ScoredPassage> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match best
            .iter_mut()
            .find(|p| p.passage.metadata.source_name == candidate.passage.metadata.source_name)
        {
            Some(existing) if candidate.distance < existing.distance => *existing = candidate,
            Some(_) => {}
            None => best.push(candidate),
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PassageMetadata;

    fn scored(source: &str, text: &str, distance: f32) -> ScoredPassage {
        let metadata = PassageMetadata {
            department: Department::new("TI"),
            document_type: "procedimento".to_string(),
            version: "1.0".to_string(),
            source_name: source.to_string(),
            page_number: 0,
        };
        ScoredPassage {
            passage: Passage::new(text, metadata, 0),
            distance,
        }
    }

    fn sources(passages: &[ScoredPassage]) -> Vec<&str> {
        passages
            .iter()
            .map(|p| p.passage.metadata.source_name.as_str())
            .collect()
    }

    #[test]
    fn test_one_passage_per_source() {
        let candidates = vec![
            scored("vpn.pdf", "a", 0.4),
            scored("vpn.pdf", "b", 0.2),
            scored("seguranca.pdf", "c", 0.3),
            scored("vpn.pdf", "d", 0.5),
        ];

        let result = rerank(candidates, &RetrievalConfig::default());
        assert_eq!(sources(&result), vec!["vpn.pdf", "seguranca.pdf"]);
        assert_eq!(result[0].passage.text, "b");
        assert_eq!(result[0].distance, 0.2);
    }

    #[test]
    fn test_tie_keeps_first_candidate() {
        let candidates = vec![scored("vpn.pdf", "first", 0.3), scored("vpn.pdf", "second", 0.3)];

        let result = rerank(candidates, &RetrievalConfig::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].passage.text, "first");
    }

    #[test]
    fn test_sorted_and_truncated() {
        let candidates = vec![
            scored("a.pdf", "a", 0.9),
            scored("b.pdf", "b", 0.1),
            scored("c.pdf", "c", 0.5),
            scored("d.pdf", "d", 0.3),
        ];

        let result = rerank(candidates, &RetrievalConfig::default());
        assert_eq!(sources(&result), vec!["b.pdf", "d.pdf", "c.pdf"]);
    }

    #[test]
    fn test_gate_drops_distant_passages() {
        let candidates = vec![scored("a.pdf", "a", 0.8), scored("b.pdf", "b", 1.7)];

        let result = rerank(candidates, &RetrievalConfig::default());
        assert_eq!(sources(&result), vec!["a.pdf"]);
    }

    #[test]
    fn test_gate_keeps_best_when_all_excluded() {
        let candidates = vec![
            scored("a.pdf", "a", 1.9),
            scored("b.pdf", "b", 1.6),
            scored("c.pdf", "c", 2.4),
        ];

        let result = rerank(candidates, &RetrievalConfig::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].passage.metadata.source_name, "b.pdf");
        assert_eq!(result[0].distance, 1.6);
    }

    #[test]
    fn test_gate_disabled() {
        let config = RetrievalConfig {
            max_distance: None,
            ..RetrievalConfig::default()
        };
        let candidates = vec![scored("a.pdf", "a", 3.0), scored("b.pdf", "b", 2.0)];

        let result = rerank(candidates, &config);
        assert_eq!(sources(&result), vec!["b.pdf", "a.pdf"]);
    }

    #[test]
    fn test_no_candidates() {
        assert!(rerank(Vec::new(), &RetrievalConfig::default()).is_empty());
    }

    #[test]
    fn test_config_yaml_and_validation() {
        let config: RetrievalConfig =
            serde_yaml::from_str("candidates: 5\nmaxDistance: null\n").unwrap();
        assert_eq!(config.candidates, 5);
        assert_eq!(config.final_count, 3);
        assert_eq!(config.max_distance, None);
        assert!(config.validate().is_ok());

        let bad = RetrievalConfig {
            final_count: 0,
            ..RetrievalConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
