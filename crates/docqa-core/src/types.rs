//! Domain types shared by the ingestion and query paths.

use serde::{Deserialize, Serialize};

/// Provenance of a chunk.
///
/// - `source_path`: path of the ingested file
/// - `page_number`: 1-based page for paginated sources, `None` otherwise
/// - `chunk_index`: position within the source document, unique and increasing
/// - `ocr`: `Some(true)` when the text came from image OCR
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source_path: String,
    pub page_number: Option<u32>,
    pub chunk_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<bool>,
}

/// The atomic unit of retrieval.
///
/// There is no numeric id: two chunks are the same entity iff text and
/// metadata are equal, which is exactly what `Eq`/`Hash` give us.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self { text: text.into(), metadata }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// L2 distance reported by the dense index. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DenseDistance(pub f32);

/// BM25 relevance from the lexical index. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct LexicalScore(pub f64);

/// Reciprocal-rank sum produced by fusion. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct FusedScore(pub f64);

/// Cross-encoder logit. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct RerankLogit(pub f32);

/// A chunk paired with the score of the stage that ranked it.
///
/// The score type parameter keeps stages apart: a `Ranked<DenseDistance>`
/// cannot be sorted together with a `Ranked<LexicalScore>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<S> {
    pub chunk: Chunk,
    pub score: S,
}

impl<S> Ranked<S> {
    pub fn new(chunk: Chunk, score: S) -> Self {
        Self { chunk, score }
    }

    pub fn into_chunk(self) -> Chunk {
        self.chunk
    }
}

/// Strip scores, keeping order.
pub fn chunks_of<S>(ranked: Vec<Ranked<S>>) -> Vec<Chunk> {
    ranked.into_iter().map(Ranked::into_chunk).collect()
}
