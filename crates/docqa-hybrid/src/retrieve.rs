//! Dense, sparse and hybrid retrieval over one loaded index snapshot.

use tracing::debug;

use docqa_core::config::Settings;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{DenseIndex, Embedder};
use docqa_core::types::{chunks_of, Chunk, DenseDistance, FusedScore, LexicalScore, Ranked};
use docqa_text::LexicalIndex;
use docqa_vector::LanceDenseIndex;

use crate::fusion::RankFuser;

fn check_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(Error::InvalidInput("top_k must be positive".into()));
    }
    Ok(())
}

pub struct DenseRetriever<'a> {
    embedder: &'a dyn Embedder,
    index: &'a dyn DenseIndex,
}

impl<'a> DenseRetriever<'a> {
    pub fn new(embedder: &'a dyn Embedder, index: &'a dyn DenseIndex) -> Self {
        Self { embedder, index }
    }

    /// Up to `top_k` chunks, nearest first.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Ranked<DenseDistance>>> {
        check_top_k(top_k)?;
        let query_vec = self
            .embedder
            .embed_batch(&[query.to_string()])?
            .pop()
            .ok_or_else(|| Error::Operation("embedder returned no vector for the query".into()))?;
        self.index.similarity_search(&query_vec, top_k)
    }
}

pub struct SparseRetriever<'a> {
    index: &'a LexicalIndex,
}

impl<'a> SparseRetriever<'a> {
    pub fn new(index: &'a LexicalIndex) -> Self {
        Self { index }
    }

    /// Up to `top_k` chunks, highest BM25 first; ties keep insertion order.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Ranked<LexicalScore>>> {
        check_top_k(top_k)?;
        self.index
            .top_k(query, top_k)
            .into_iter()
            .map(|(i, score)| {
                let chunk = self
                    .index
                    .chunk(i)
                    .ok_or_else(|| Error::Operation(format!("lexical hit {i} is outside the corpus")))?;
                Ok(Ranked::new(chunk, score))
            })
            .collect()
    }
}

/// Runs dense and sparse retrieval side by side and fuses the two rankings.
pub struct HybridRetriever {
    embedder: Box<dyn Embedder>,
    dense: Box<dyn DenseIndex>,
    sparse: LexicalIndex,
    fuser: RankFuser,
}

impl HybridRetriever {
    pub fn new(embedder: Box<dyn Embedder>, dense: Box<dyn DenseIndex>, sparse: LexicalIndex, rrf_k: u32) -> Self {
        Self { embedder, dense, sparse, fuser: RankFuser::new(rrf_k) }
    }

    /// Open both persisted indexes. A missing sparse blob fails here; a missing
    /// dense store fails on the first query.
    pub fn open(settings: &Settings, embedder: Box<dyn Embedder>) -> Result<Self> {
        let sparse = LexicalIndex::load(&settings.sparse_path())?;
        let dense = LanceDenseIndex::new(&settings.dense_dir(), embedder.model_id(), embedder.dim())?;
        Ok(Self::new(embedder, Box::new(dense), sparse, settings.retrieval.rrf_k))
    }

    /// Fused candidates with their reciprocal-rank scores. Each side
    /// contributes at most `top_k` hits, so the result holds up to `2 * top_k`.
    pub fn fused_candidates(&self, query: &str, top_k: usize) -> Result<Vec<Ranked<FusedScore>>> {
        check_top_k(top_k)?;
        let dense = DenseRetriever::new(self.embedder.as_ref(), self.dense.as_ref());
        let sparse = SparseRetriever::new(&self.sparse);
        let (dense_hits, sparse_hits) =
            rayon::join(|| dense.retrieve(query, top_k), || sparse.retrieve(query, top_k));
        let dense_hits = chunks_of(dense_hits?);
        let sparse_hits = chunks_of(sparse_hits?);
        let fused = self.fuser.fuse(&[&dense_hits, &sparse_hits]);
        debug!(dense = dense_hits.len(), sparse = sparse_hits.len(), fused = fused.len(), "hybrid retrieval");
        Ok(fused)
    }

    /// The `top_k` best fused chunks.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Chunk>> {
        let mut fused = self.fused_candidates(query, top_k)?;
        fused.truncate(top_k);
        Ok(chunks_of(fused))
    }
}
