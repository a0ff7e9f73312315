//! Locating and loading local BERT-family checkpoints.
//!
//! A model directory holds `config.json`, `tokenizer.json` and either
//! `model.safetensors` or `pytorch_model.bin`.

use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::Config as BertConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;
use tracing::info;

use docqa_core::error::Error;

/// `model_id` may be a path to an existing directory; otherwise it is looked
/// up under `models_dir`.
pub fn resolve_model_dir(models_dir: &Path, model_id: &str) -> docqa_core::Result<PathBuf> {
    let direct = PathBuf::from(model_id);
    if direct.is_dir() {
        return Ok(direct);
    }
    let nested = models_dir.join(model_id);
    if nested.is_dir() {
        info!("using model dir {}", nested.display());
        return Ok(nested);
    }
    Err(Error::ModelUnavailable(format!(
        "model '{}' not found under {}",
        model_id,
        models_dir.display()
    )))
}

pub struct Checkpoint {
    pub config: BertConfig,
    pub hidden_size: usize,
    pub tokenizer: Tokenizer,
    pub weights: HashMap<String, Tensor>,
}

impl Checkpoint {
    pub fn load(dir: &Path, device: &Device) -> Result<Self> {
        let tokenizer_path = dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;

        let config_path = dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow!("Failed to read {}: {}", config_path.display(), e))?;
        let config: BertConfig = serde_json::from_str(&raw)?;
        let hidden_size = serde_json::from_str::<serde_json::Value>(&raw)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow!("{} has no hidden_size", config_path.display()))? as usize;

        let safetensors = dir.join("model.safetensors");
        let weights: HashMap<String, Tensor> = if safetensors.exists() {
            candle_core::safetensors::load(&safetensors, device)?
        } else {
            let bin = dir.join("pytorch_model.bin");
            candle_core::pickle::read_all(&bin)?.into_iter().collect()
        };
        info!(dir = %dir.display(), tensors = weights.len(), "checkpoint loaded");
        Ok(Self { config, hidden_size, tokenizer, weights })
    }

    pub fn var_builder(self, device: &Device) -> (BertConfig, usize, Tokenizer, VarBuilder<'static>) {
        let vb = VarBuilder::from_tensors(self.weights, DType::F32, device);
        (self.config, self.hidden_size, self.tokenizer, vb)
    }
}
