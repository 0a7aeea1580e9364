//! Vector index abstraction for embedded passages.
//!
//! Backends store [`IndexedEntry`] values and answer k-nearest-neighbour
//! queries by squared Euclidean distance, optionally restricted by an
//! exact-match metadata filter.

pub mod lance;
pub mod memory;

pub use lance::LanceDbIndex;
pub use memory::MemoryIndex;

use crate::types::{Department, IndexedEntry, PassageMetadata, ScoredPassage};
use policyqa_core::AppResult;

/// Trait for vector index backends.
///
/// Methods take `&self`; callers coordinate writers against readers.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend identifier ("memory", "lancedb").
    fn backend_name(&self) -> &str;

    /// Number of stored entries.
    async fn count(&self) -> AppResult<usize>;

    /// Append entries.
    async fn insert(&self, entries: &[IndexedEntry]) -> AppResult<()>;

    /// Up to `k` nearest entries matching `filter`, ascending by distance.
    async fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> AppResult<Vec<ScoredPassage>>;

    /// Remove every entry.
    async fn reset(&self) -> AppResult<()>;
}

/// Exact-match restriction on passage metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub department: Option<Department>,
    pub document_type: Option<String>,
}

impl MetadataFilter {
    pub fn department(department: Department) -> Self {
        Self {
            department: Some(department),
            document_type: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.department.is_none() && self.document_type.is_none()
    }

    pub fn matches(&self, metadata: &PassageMetadata) -> bool {
        self.department
            .as_ref()
            .map_or(true, |d| *d == metadata.department)
            && self
                .document_type
                .as_ref()
                .map_or(true, |t| *t == metadata.document_type)
    }

    /// SQL predicate over the LanceDB columns, `None` when unrestricted.
    pub fn to_sql(&self) -> Option<String> {
        let mut clauses = Vec::new();
        if let Some(department) = &self.department {
            clauses.push(format!("department = '{}'", escape_sql(department.as_str())));
        }
        if let Some(document_type) = &self.document_type {
            clauses.push(format!("document_type = '{}'", escape_sql(document_type)));
        }

        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }
}

fn escape_sql(value: &str) -> String {
    value.replace('\'', "''")
}

/// Squared Euclidean distance.
pub(crate) fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(department: &str, document_type: &str) -> PassageMetadata {
        PassageMetadata {
            department: Department::new(department),
            document_type: document_type.to_string(),
            version: "1.0".to_string(),
            source_name: "doc.pdf".to_string(),
            page_number: 0,
        }
    }

    #[test]
    fn test_filter_matches() {
        let filter = MetadataFilter::department(Department::new("TI"));
        assert!(filter.matches(&metadata("TI", "procedimento")));
        assert!(!filter.matches(&metadata("RH", "procedimento")));
        assert!(MetadataFilter::default().matches(&metadata("RH", "politica")));

        let both = MetadataFilter {
            department: Some(Department::new("TI")),
            document_type: Some("politica".to_string()),
        };
        assert!(both.matches(&metadata("TI", "politica")));
        assert!(!both.matches(&metadata("TI", "procedimento")));
    }

    #[test]
    fn test_filter_sql() {
        assert_eq!(MetadataFilter::default().to_sql(), None);
        assert_eq!(
            MetadataFilter::department(Department::new("TI")).to_sql(),
            Some("department = 'TI'".to_string())
        );

        let quoted = MetadataFilter {
            department: Some(Department::new("RH")),
            document_type: Some("o'brien".to_string()),
        };
        assert_eq!(
            quoted.to_sql(),
            Some("department = 'RH' AND document_type = 'o''brien'".to_string())
        );
    }

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }
}
