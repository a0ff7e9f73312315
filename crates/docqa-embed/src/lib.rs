//! docqa-embed
//!
//! Local candle models: the sentence embedder used for chunking and dense
//! retrieval, and the cross-encoder used for reranking.

pub mod cross_encoder;
pub mod device;
pub mod hash;
pub mod model;
pub mod pool;
pub mod sentence;
pub mod tokenize;

use anyhow::Result;
use tracing::info;

use docqa_core::config::Settings;
use docqa_core::traits::Embedder;

pub use cross_encoder::CrossEncoder;
pub use hash::HashEmbedder;
pub use model::resolve_model_dir;
pub use pool::masked_mean_l2;
pub use sentence::BertEmbedder;

/// Dimension of the hashing embedder, matching MiniLM-L6.
pub const FAKE_EMBEDDING_DIM: usize = 384;

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// The configured sentence embedder, or the hashing embedder when
/// `APP_USE_FAKE_EMBEDDINGS` is set.
pub fn get_default_embedder(settings: &Settings) -> Result<Box<dyn Embedder>> {
    if use_fake_embeddings() {
        info!("using HashEmbedder");
        return Ok(Box::new(HashEmbedder::new(FAKE_EMBEDDING_DIM)));
    }
    let dir = resolve_model_dir(&settings.models_dir(), &settings.embedding.model)?;
    Ok(Box::new(BertEmbedder::load(&dir, &settings.embedding.model)?))
}
