use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::{Encoding, Tokenizer};

/// Model inputs for a padded batch, all `[B, T]` `u32` tensors.
pub struct EncodedBatch {
    pub input_ids: Tensor,
    pub token_type_ids: Tensor,
    pub attention_mask: Tensor,
}

struct Row {
    ids: Vec<u32>,
    type_ids: Vec<u32>,
    mask: Vec<u32>,
}

/// Truncate to `max_len` while keeping the trailing special token.
fn to_row(enc: &Encoding, max_len: usize) -> Row {
    let mut ids = enc.get_ids().to_vec();
    let mut type_ids = enc.get_type_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len && max_len > 1 {
        let (last_id, last_type) = (ids[ids.len() - 1], type_ids[type_ids.len() - 1]);
        ids.truncate(max_len - 1);
        type_ids.truncate(max_len - 1);
        mask.truncate(max_len - 1);
        ids.push(last_id);
        type_ids.push(last_type);
        mask.push(1);
    }
    Row { ids, type_ids, mask }
}

fn pad_id(tokenizer: &Tokenizer) -> u32 {
    tokenizer
        .get_padding()
        .map(|p| p.pad_id)
        .or_else(|| tokenizer.token_to_id("[PAD]"))
        .unwrap_or(0)
}

fn stack(rows: Vec<Row>, pad: u32, device: &Device) -> Result<EncodedBatch> {
    let batch = rows.len();
    let width = rows.iter().map(|r| r.ids.len()).max().unwrap_or(0).max(1);
    let mut ids = Vec::with_capacity(batch * width);
    let mut type_ids = Vec::with_capacity(batch * width);
    let mut mask = Vec::with_capacity(batch * width);
    for row in rows {
        let pad_len = width - row.ids.len();
        ids.extend(row.ids);
        ids.extend(std::iter::repeat(pad).take(pad_len));
        type_ids.extend(row.type_ids);
        type_ids.extend(std::iter::repeat(0).take(pad_len));
        mask.extend(row.mask);
        mask.extend(std::iter::repeat(0).take(pad_len));
    }
    Ok(EncodedBatch {
        input_ids: Tensor::from_vec(ids, (batch, width), device)?,
        token_type_ids: Tensor::from_vec(type_ids, (batch, width), device)?,
        attention_mask: Tensor::from_vec(mask, (batch, width), device)?,
    })
}

/// Encode single texts, right-padded to the longest row.
pub fn encode_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<EncodedBatch> {
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        rows.push(to_row(&enc, max_len));
    }
    stack(rows, pad_id(tokenizer), device)
}

/// Encode one (query, passage) pair as `[CLS] q [SEP] p [SEP]` with segment ids.
pub fn encode_pair(tokenizer: &Tokenizer, query: &str, passage: &str, max_len: usize, device: &Device) -> Result<EncodedBatch> {
    let enc = tokenizer.encode((query, passage), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    stack(vec![to_row(&enc, max_len)], pad_id(tokenizer), device)
}
