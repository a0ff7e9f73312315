//! docqa-hybrid
//!
//! Query-time pipeline (dense + sparse retrieval, reciprocal rank fusion,
//! cross-encoder reranking, intent classification) and the ingestion
//! pipeline that builds the indexes it reads.

pub mod classify;
pub mod context;
pub mod fusion;
pub mod ingest;
pub mod ollama;
pub mod rerank;
pub mod retrieve;
pub mod verdict;

pub use classify::{heuristic_classify, QueryClassifier, QueryIntent};
pub use context::format_context;
pub use fusion::RankFuser;
pub use ingest::{IngestReport, Ingestor};
pub use ollama::OllamaGenerator;
pub use rerank::Reranker;
pub use retrieve::{DenseRetriever, HybridRetriever, SparseRetriever};
pub use verdict::{QualityVerdict, Supported};
