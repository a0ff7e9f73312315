use anyhow::{anyhow, Result};
use arrow_array::{Array, BooleanArray, Float32Array, Int32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Connection;

use docqa_core::types::{Chunk, ChunkMetadata, DenseDistance, Ranked};

use crate::schema::TABLE_NAME;

/// Nearest `k` rows by L2 distance, closest first. Equal distances keep
/// ingestion order, including ties that straddle the `k` boundary: the fetch
/// widens until the row after the cut is strictly farther.
pub async fn search_table(db: &Connection, query_vec: &[f32], k: usize) -> Result<Vec<Ranked<DenseDistance>>> {
	let table = db.open_table(TABLE_NAME).execute().await?;
	if k == 0 || table.count_rows(None).await? == 0 {
		return Ok(Vec::new());
	}
	let mut limit = k;
	let mut hits = loop {
		let mut stream = table.vector_search(query_vec.to_vec())?.limit(limit).execute().await?;
		let mut hits: Vec<(i32, Ranked<DenseDistance>)> = Vec::new();
		while let Some(batch) = TryStreamExt::try_next(&mut stream).await? {
			decode_batch(&batch, &mut hits)?;
		}
		hits.sort_by(|(oa, a), (ob, b)| a.score.0.total_cmp(&b.score.0).then(oa.cmp(ob)));
		if hits.len() < limit || hits[limit - 1].1.score.0 > hits[k - 1].1.score.0 {
			break hits;
		}
		limit = limit.saturating_mul(2);
	};
	hits.truncate(k);
	Ok(hits.into_iter().map(|(_, r)| r).collect())
}

fn decode_batch(batch: &RecordBatch, out: &mut Vec<(i32, Ranked<DenseDistance>)>) -> Result<()> {
	let text = column::<StringArray>(batch, "text")?;
	let source = column::<StringArray>(batch, "source_path")?;
	let page = column::<Int32Array>(batch, "page_number")?;
	let chunk_index = column::<Int32Array>(batch, "chunk_index")?;
	let ocr = column::<BooleanArray>(batch, "ocr")?;
	let ordinal = column::<Int32Array>(batch, "ordinal")?;
	let distance = column::<Float32Array>(batch, "_distance")?;
	for i in 0..batch.num_rows() {
		let metadata = ChunkMetadata {
			source_path: source.value(i).to_string(),
			page_number: (!page.is_null(i)).then(|| page.value(i)).map(u32::try_from).transpose()?,
			chunk_index: usize::try_from(chunk_index.value(i))?,
			ocr: (!ocr.is_null(i)).then(|| ocr.value(i)),
		};
		out.push((ordinal.value(i), Ranked::new(Chunk::new(text.value(i), metadata), DenseDistance(distance.value(i)))));
	}
	Ok(())
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
	batch
		.column_by_name(name)
		.ok_or_else(|| anyhow!("dense index row is missing column '{}'", name))?
		.as_any()
		.downcast_ref::<T>()
		.ok_or_else(|| anyhow!("dense index column '{}' has an unexpected type", name))
}
