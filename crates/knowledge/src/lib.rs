//! Policy knowledge base and grounded question answering.
//!
//! Ingestion runs Loader → Chunker → Index Store. Queries run
//! Classifier + Retriever → Context Assembler → Generator, all wired
//! together by [`RagPipeline`].

pub mod chunker;
pub mod classifier;
pub mod config;
pub mod context;
pub mod embeddings;
pub mod generator;
pub mod index;
pub mod ingest;
pub mod loader;
pub mod pipeline;
pub mod retriever;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::{chunk_documents, ChunkingConfig};
pub use classifier::{DepartmentClassifier, DepartmentKeywords};
pub use config::{IndexBackend, RagConfig};
pub use context::{assemble, AssembledContext};
pub use generator::{GenerationConfig, GroundedGenerator};
pub use index::{MetadataFilter, VectorIndex};
pub use ingest::{IngestFailure, IngestReport};
pub use loader::{load_document, DocumentSpec, FileExtractor, PageExtractor};
pub use pipeline::{create_llm_client, open_store, RagPipeline};
pub use retriever::{rerank, Retrieval, RetrievalConfig, Retriever};
pub use store::{IndexStore, PopulateMode, PopulateStats};
pub use types::{
    AnswerResult, Citation, Department, Passage, PassageMetadata, QueryRequest, QueryResponse,
    ScoredPassage, SourceDocument, NOT_FOUND_ANSWER,
};
