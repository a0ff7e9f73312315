use anyhow::{ensure, Result};
use arrow_array::{BooleanArray, FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use docqa_core::types::Chunk;

use crate::schema::{build_arrow_schema, TABLE_NAME};
use crate::table::open_db;

const BATCH_SIZE: usize = 1000;

/// Drop whatever lives in `dir` and write `chunks` as a fresh table.
pub async fn rebuild_table(dir: &Path, chunks: &[Chunk], embeddings: &[Vec<f32>], dim: usize) -> Result<()> {
	ensure!(chunks.len() == embeddings.len(), "chunks and embeddings length must match");
	ensure!(embeddings.iter().all(|e| e.len() == dim), "every embedding must have dimension {}", dim);
	if dir.exists() {
		std::fs::remove_dir_all(dir)?;
	}
	std::fs::create_dir_all(dir)?;
	let db = open_db(dir).await?;
	let dim = i32::try_from(dim)?;

	if chunks.is_empty() {
		let schema = build_arrow_schema(dim);
		let empty = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
		db.create_table(TABLE_NAME, Box::new(empty)).execute().await?;
		info!(dir = %dir.display(), "dense index rebuilt empty");
		return Ok(());
	}

	let pb = ProgressBar::new(chunks.len() as u64);
	pb.set_style(
		ProgressStyle::default_bar()
			.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?
			.progress_chars("#>-"),
	);
	let mut created = false;
	for (batch_no, (chunk_batch, emb_batch)) in chunks.chunks(BATCH_SIZE).zip(embeddings.chunks(BATCH_SIZE)).enumerate() {
		let offset = batch_no * BATCH_SIZE;
		let batch = to_record_batch(chunk_batch, emb_batch, offset, dim)?;
		insert_batch(&db, batch, created).await?;
		created = true;
		pb.inc(chunk_batch.len() as u64);
	}
	pb.finish_with_message("dense index written");
	info!(chunks = chunks.len(), dir = %dir.display(), "dense index rebuilt");
	Ok(())
}

async fn insert_batch(db: &Connection, batch: RecordBatch, table_exists: bool) -> Result<()> {
	let schema = batch.schema();
	let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
	if table_exists {
		db.open_table(TABLE_NAME).execute().await?.add(reader).execute().await?;
	} else {
		db.create_table(TABLE_NAME, reader).execute().await?;
	}
	Ok(())
}

fn to_record_batch(chunks: &[Chunk], embeddings: &[Vec<f32>], offset: usize, dim: i32) -> Result<RecordBatch> {
	let mut ordinals = Vec::with_capacity(chunks.len());
	let mut chunk_indices = Vec::with_capacity(chunks.len());
	for (i, c) in chunks.iter().enumerate() {
		ordinals.push(i32::try_from(offset + i)?);
		chunk_indices.push(i32::try_from(c.metadata.chunk_index)?);
	}
	let pages: Vec<Option<i32>> = chunks
		.iter()
		.map(|c| c.metadata.page_number.map(i32::try_from).transpose())
		.collect::<std::result::Result<_, _>>()?;
	let vectors = embeddings.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
	let record_batch = RecordBatch::try_new(build_arrow_schema(dim), vec![
		Arc::new(StringArray::from(chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>())),
		Arc::new(StringArray::from(chunks.iter().map(|c| c.metadata.source_path.as_str()).collect::<Vec<_>>())),
		Arc::new(Int32Array::from(pages)),
		Arc::new(Int32Array::from(chunk_indices)),
		Arc::new(BooleanArray::from(chunks.iter().map(|c| c.metadata.ocr).collect::<Vec<_>>())),
		Arc::new(Int32Array::from(ordinals)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim)),
	])?;
	Ok(record_batch)
}
