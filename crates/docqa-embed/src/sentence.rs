use anyhow::Result;
use candle_core::Device;
use candle_transformers::models::bert::BertModel;
use std::path::Path;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use docqa_core::traits::Embedder;

use crate::device::select_device;
use crate::model::Checkpoint;
use crate::pool::masked_mean_l2;
use crate::tokenize::encode_batch;

const MAX_LEN: usize = 256;
const BATCH_SIZE: usize = 32;

/// Sentence-transformers style BERT encoder: masked mean pooling + L2 norm.
pub struct BertEmbedder {
    model_id: String,
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
}

impl BertEmbedder {
    pub fn load(dir: &Path, model_id: &str) -> Result<Self> {
        let device = select_device();
        info!(model = model_id, "loading sentence embedder");
        let (config, dim, tokenizer, vb) = Checkpoint::load(dir, &device)?.var_builder(&device);
        let model = BertModel::load(vb, &config)?;
        Ok(Self { model_id: model_id.to_string(), model, tokenizer, device, dim })
    }

    fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let batch = encode_batch(&self.tokenizer, texts, MAX_LEN, &self.device)?;
        let hidden = self.model.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &batch.attention_mask)?;
        Ok(pooled.to_device(&Device::Cpu)?.to_vec2::<f32>()?)
    }
}

impl Embedder for BertEmbedder {
    fn model_id(&self) -> &str { &self.model_id }
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = Instant::now();
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            out.extend(self.embed_chunk(chunk)?);
        }
        debug!(texts = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "embedded batch");
        Ok(out)
    }
}
