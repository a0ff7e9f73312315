use std::path::Path;

use crate::error::Result;
use crate::types::{Chunk, DenseDistance, Ranked};

/// Sentence embedding model. Vectors must be L2-normalized and `dim()` long.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model; the dense store is keyed by it.
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Dense side of the corpus store.
pub trait DenseIndex: Send + Sync {
    /// Replace the whole index with `chunks`; `embeddings[i]` belongs to `chunks[i]`.
    fn rebuild(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()>;

    /// Up to `k` nearest chunks, ascending distance.
    fn similarity_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<Ranked<DenseDistance>>>;
}

/// Joint (query, passage) relevance model.
pub trait PairScorer: Send + Sync {
    /// One logit per passage, in input order.
    fn score_pairs(&self, query: &str, passages: &[&str]) -> anyhow::Result<Vec<f32>>;
}

/// External generative model used for short completions.
pub trait LabelGenerator: Send + Sync {
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Text extraction for raster images.
pub trait OcrEngine: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String>;
}
