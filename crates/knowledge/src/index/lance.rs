//! LanceDB-backed vector index implementation.

use crate::index::{squared_l2, MetadataFilter, VectorIndex};
use crate::types::{Department, IndexedEntry, Passage, PassageMetadata, ScoredPassage};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt32Array,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};
use policyqa_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// LanceDB-backed vector index for passages.
pub struct LanceDbIndex {
    table: Table,
    embedding_dim: usize,
}

impl LanceDbIndex {
    /// Open `table_name` under `db_path`, creating an empty table on first use.
    pub async fn open(db_path: &Path, table_name: &str, embedding_dim: usize) -> AppResult<Self> {
        std::fs::create_dir_all(db_path).map_err(|e| {
            AppError::IndexUnavailable(format!("Failed to create index directory: {}", e))
        })?;

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| unavailable("Failed to connect to LanceDB", e))?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| unavailable("Failed to list tables", e))?;

        let table = if table_names.iter().any(|name| name == table_name) {
            conn.open_table(table_name)
                .execute()
                .await
                .map_err(|e| unavailable("Failed to open table", e))?
        } else {
            let schema = Self::create_schema(embedding_dim);
            let empty_batch = RecordBatch::new_empty(schema.clone());

            conn.create_table(
                table_name,
                RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| unavailable("Failed to create table", e))?
        };

        tracing::debug!("Initialized LanceDB index at {:?} (table '{}')", db_path, table_name);

        Ok(Self {
            table,
            embedding_dim,
        })
    }

    fn create_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new("department", DataType::Utf8, false),
            Field::new("document_type", DataType::Utf8, false),
            Field::new("version", DataType::Utf8, false),
            Field::new("source_name", DataType::Utf8, false),
            Field::new("page_number", DataType::UInt32, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }

    /// Convert entries to one Arrow RecordBatch.
    fn entries_to_batch(&self, entries: &[IndexedEntry]) -> AppResult<RecordBatch> {
        let mut flat_embeddings = Vec::with_capacity(entries.len() * self.embedding_dim);
        for entry in entries {
            if entry.embedding.len() != self.embedding_dim {
                return Err(AppError::IndexUnavailable(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    self.embedding_dim,
                    entry.embedding.len()
                )));
            }
            flat_embeddings.extend_from_slice(&entry.embedding);
        }

        let embedding_array = FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.embedding_dim as i32,
            Arc::new(Float32Array::from(flat_embeddings)),
            None,
        )
        .map_err(|e| unavailable("Failed to build embedding column", e))?;

        let page_numbers = UInt32Array::from(
            entries
                .iter()
                .map(|e| e.passage.metadata.page_number)
                .collect::<Vec<_>>(),
        );

        RecordBatch::try_new(
            Self::create_schema(self.embedding_dim),
            vec![
                Arc::new(string_column(entries, |e| e.passage.id.as_str())),
                Arc::new(string_column(entries, |e| e.passage.text.as_str())),
                Arc::new(string_column(entries, |e| e.passage.metadata.department.as_str())),
                Arc::new(string_column(entries, |e| e.passage.metadata.document_type.as_str())),
                Arc::new(string_column(entries, |e| e.passage.metadata.version.as_str())),
                Arc::new(string_column(entries, |e| e.passage.metadata.source_name.as_str())),
                Arc::new(page_numbers),
                Arc::new(embedding_array),
            ],
        )
        .map_err(|e| unavailable("Failed to create RecordBatch", e))
    }

    /// Convert one Arrow row back to a passage and its stored embedding.
    fn row_to_passage(batch: &RecordBatch, row: usize) -> AppResult<(Passage, Vec<f32>)> {
        let text = |name: &str| -> AppResult<String> {
            batch
                .column_by_name(name)
                .and_then(|col| col.as_any().downcast_ref::<StringArray>())
                .map(|col| col.value(row).to_string())
                .ok_or_else(|| AppError::IndexUnavailable(format!("Invalid {} column", name)))
        };

        let page_number = batch
            .column_by_name("page_number")
            .and_then(|col| col.as_any().downcast_ref::<UInt32Array>())
            .map(|col| col.value(row))
            .ok_or_else(|| AppError::IndexUnavailable("Invalid page_number column".to_string()))?;

        let embedding_list = batch
            .column_by_name("embedding")
            .and_then(|col| col.as_any().downcast_ref::<FixedSizeListArray>())
            .ok_or_else(|| AppError::IndexUnavailable("Invalid embedding column".to_string()))?;
        let values = embedding_list.value(row);
        let values = values
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| AppError::IndexUnavailable("Invalid embedding values".to_string()))?;
        let embedding: Vec<f32> = values.values().to_vec();

        let passage = Passage {
            id: text("id")?,
            text: text("text")?,
            metadata: PassageMetadata {
                department: Department::new(text("department")?),
                document_type: text("document_type")?,
                version: text("version")?,
                source_name: text("source_name")?,
                page_number,
            },
        };

        Ok((passage, embedding))
    }
}

#[async_trait::async_trait]
impl VectorIndex for LanceDbIndex {
    fn backend_name(&self) -> &str {
        "lancedb"
    }

    async fn count(&self) -> AppResult<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| unavailable("Failed to count rows", e))
    }

    async fn insert(&self, entries: &[IndexedEntry]) -> AppResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let batch = self.entries_to_batch(entries)?;
        let schema = batch.schema();

        self.table
            .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
            .execute()
            .await
            .map_err(|e| unavailable("Failed to add passages", e))?;

        tracing::debug!("Inserted {} passages into LanceDB", entries.len());
        Ok(())
    }

    async fn search(
        &self,
        embedding: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> AppResult<Vec<ScoredPassage>> {
        if embedding.len() != self.embedding_dim {
            return Err(AppError::IndexUnavailable(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                embedding.len()
            )));
        }

        if k == 0 || self.count().await? == 0 {
            return Ok(Vec::new());
        }

        let mut query = self
            .table
            .query()
            .nearest_to(embedding.to_vec())
            .map_err(|e| unavailable("Failed to create query", e))?
            .distance_type(DistanceType::L2)
            .limit(k);

        if let Some(predicate) = filter.and_then(MetadataFilter::to_sql) {
            tracing::debug!("Applying filter: {}", predicate);
            query = query.only_if(predicate);
        }

        let batches: Vec<RecordBatch> = query
            .execute()
            .await
            .map_err(|e| unavailable("Failed to execute search", e))?
            .try_collect()
            .await
            .map_err(|e| unavailable("Failed to collect results", e))?;

        let mut scored = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                let (passage, stored) = Self::row_to_passage(batch, row)?;
                scored.push(ScoredPassage {
                    distance: squared_l2(embedding, &stored),
                    passage,
                });
            }
        }

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(k);

        tracing::debug!("Retrieved {} passages (requested top-{})", scored.len(), k);

        Ok(scored)
    }

    async fn reset(&self) -> AppResult<()> {
        if self.count().await? > 0 {
            self.table
                .delete("id IS NOT NULL")
                .await
                .map_err(|e| unavailable("Failed to reset index", e))?;
        }

        tracing::info!("Reset LanceDB index");
        Ok(())
    }
}

fn string_column<'a>(
    entries: &'a [IndexedEntry],
    field: impl Fn(&'a IndexedEntry) -> &'a str,
) -> StringArray {
    StringArray::from(entries.iter().map(field).collect::<Vec<_>>())
}

fn unavailable(context: &str, err: impl std::fmt::Display) -> AppError {
    AppError::IndexUnavailable(format!("{}: {}", context, err))
}
