//! BERT cross-encoder (`BertForSequenceClassification` with one label).
//!
//! The pair is encoded jointly, the `[CLS]` state goes through the BERT pooler
//! (dense + tanh) and a single-logit classifier head.

use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use candle_nn::{linear, Linear, Module};
use candle_transformers::models::bert::BertModel;
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::info;

use docqa_core::traits::PairScorer;

use crate::device::select_device;
use crate::model::Checkpoint;
use crate::tokenize::encode_pair;

const MAX_LEN: usize = 512;

pub struct CrossEncoder {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
}

impl CrossEncoder {
    pub fn load(dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %dir.display(), "loading cross-encoder");
        let (config, hidden, tokenizer, vb) = Checkpoint::load(dir, &device)?.var_builder(&device);
        let bert = BertModel::load(vb.pp("bert"), &config)?;
        let pooler = linear(hidden, hidden, vb.pp("bert.pooler.dense"))?;
        let classifier = linear(hidden, 1, vb.pp("classifier"))?;
        Ok(Self { bert, pooler, classifier, tokenizer, device })
    }

    fn logit(&self, query: &str, passage: &str) -> Result<f32> {
        let batch = encode_pair(&self.tokenizer, query, passage, MAX_LEN, &self.device)?;
        let hidden = self.bert.forward(&batch.input_ids, &batch.token_type_ids, Some(&batch.attention_mask))?;
        let cls: Tensor = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?;
        logits
            .flatten_all()?
            .to_vec1::<f32>()?
            .first()
            .copied()
            .ok_or_else(|| anyhow!("cross-encoder produced no logit"))
    }
}

impl PairScorer for CrossEncoder {
    fn score_pairs(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        passages.iter().map(|p| self.logit(query, p)).collect()
    }
}
