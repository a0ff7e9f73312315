//! Cross-encoder reranking of the fused shortlist.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info};

use docqa_core::config::Settings;
use docqa_core::error::{Error, Result};
use docqa_core::traits::PairScorer;
use docqa_core::types::{chunks_of, Chunk, Ranked, RerankLogit};
use docqa_embed::{resolve_model_dir, CrossEncoder};

type ScorerLoader = Box<dyn Fn() -> Result<Arc<dyn PairScorer>> + Send + Sync>;

/// Holds the pair-scoring model, loaded on the first non-empty call and
/// reused afterwards. Create one per process and share it by reference.
pub struct Reranker {
    loader: ScorerLoader,
    scorer: OnceLock<Arc<dyn PairScorer>>,
}

impl Reranker {
    /// Reranker backed by the configured cross-encoder checkpoint.
    pub fn create(settings: &Settings) -> Self {
        let models_dir = settings.models_dir();
        let model = settings.rerank.model.clone();
        Self::with_loader(move || {
            let dir = resolve_model_dir(&models_dir, &model)?;
            let encoder = CrossEncoder::load(&dir).map_err(|e| Error::ModelUnavailable(format!("{model}: {e:#}")))?;
            Ok(Arc::new(encoder) as Arc<dyn PairScorer>)
        })
    }

    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn PairScorer>> + Send + Sync + 'static,
    {
        Self { loader: Box::new(loader), scorer: OnceLock::new() }
    }

    /// Reranker around an already loaded scorer.
    pub fn with_scorer(scorer: Arc<dyn PairScorer>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(scorer);
        Self {
            loader: Box::new(|| Err(Error::ModelUnavailable("scorer was supplied preloaded".into()))),
            scorer: cell,
        }
    }

    fn scorer(&self) -> Result<&Arc<dyn PairScorer>> {
        if let Some(scorer) = self.scorer.get() {
            return Ok(scorer);
        }
        let loaded = (self.loader)()?;
        info!("reranker model loaded");
        Ok(self.scorer.get_or_init(|| loaded))
    }

    /// Candidates with their logits, best first, at most `top_n` of them.
    pub fn rerank_scored(&self, query: &str, candidates: &[Chunk], top_n: usize) -> Result<Vec<Ranked<RerankLogit>>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        if top_n == 0 {
            return Err(Error::InvalidInput("top_n must be positive".into()));
        }
        let passages: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        let logits = self.scorer()?.score_pairs(query, &passages)?;
        if logits.len() != candidates.len() {
            return Err(Error::Operation(format!(
                "reranker returned {} scores for {} candidates",
                logits.len(),
                candidates.len()
            )));
        }
        let mut ranked: Vec<Ranked<RerankLogit>> = candidates
            .iter()
            .zip(logits)
            .map(|(chunk, logit)| Ranked::new(chunk.clone(), RerankLogit(logit)))
            .collect();
        ranked.sort_by(|a, b| b.score.0.total_cmp(&a.score.0));
        ranked.truncate(top_n);
        debug!(candidates = candidates.len(), kept = ranked.len(), "reranked");
        Ok(ranked)
    }

    pub fn rerank(&self, query: &str, candidates: &[Chunk], top_n: usize) -> Result<Vec<Chunk>> {
        Ok(chunks_of(self.rerank_scored(query, candidates, top_n)?))
    }
}
