//! On-disk form of the lexical index: one JSON blob holding the ordered chunk
//! texts, the parallel metadatas and the BM25 statistics.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use docqa_core::error::{Error, IndexKind, Result};
use docqa_core::types::ChunkMetadata;

use crate::lexical::{Bm25Stats, LexicalIndex};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SparseBlob {
	format_version: u32,
	texts: Vec<String>,
	metadatas: Vec<ChunkMetadata>,
	stats: Bm25Stats,
}

impl LexicalIndex {
	/// Write atomically: serialize into a sibling temp file, then rename.
	pub fn save(&self, path: &Path) -> Result<()> {
		self.stage(path)?.commit()
	}

	/// Serialize into a temp file next to `path` without touching `path`.
	/// Nothing is visible until [`StagedIndex::commit`]; dropping the stage
	/// removes the temp file.
	pub fn stage(&self, path: &Path) -> Result<StagedIndex> {
		let parent = match path.parent() {
			Some(p) if !p.as_os_str().is_empty() => p,
			_ => Path::new("."),
		};
		fs::create_dir_all(parent)?;
		let blob = SparseBlob {
			format_version: FORMAT_VERSION,
			texts: self.texts.clone(),
			metadatas: self.metadatas.clone(),
			stats: self.stats.clone(),
		};
		let mut tmp = NamedTempFile::new_in(parent)?;
		{
			let mut writer = BufWriter::new(tmp.as_file_mut());
			serde_json::to_writer(&mut writer, &blob).context("serialize sparse index")?;
			writer.flush()?;
		}
		Ok(StagedIndex { tmp, path: path.to_path_buf(), chunks: self.len() })
	}

	pub fn load(path: &Path) -> Result<Self> {
		if !path.is_file() {
			return Err(Error::not_initialized(IndexKind::Sparse, path));
		}
		let reader = BufReader::new(File::open(path)?);
		let blob: SparseBlob = serde_json::from_reader(reader)
			.with_context(|| format!("parse sparse index {}", path.display()))?;
		if blob.format_version != FORMAT_VERSION {
			return Err(Error::Operation(format!(
				"sparse index {} has format {}, expected {}; re-run ingestion",
				path.display(),
				blob.format_version,
				FORMAT_VERSION
			)));
		}
		let n = blob.texts.len();
		if blob.metadatas.len() != n || blob.stats.doc_lengths.len() != n || blob.stats.term_freqs.len() != n {
			return Err(Error::Operation(format!("sparse index {} is inconsistent", path.display())));
		}
		Ok(Self { texts: blob.texts, metadatas: blob.metadatas, stats: blob.stats })
	}
}

/// A fully written sparse blob waiting to replace the live one.
pub struct StagedIndex {
	tmp: NamedTempFile,
	path: PathBuf,
	chunks: usize,
}

impl StagedIndex {
	pub fn commit(self) -> Result<()> {
		let path = self.path;
		self.tmp.persist(&path).map_err(|e| Error::Operation(format!("persist {}: {}", path.display(), e)))?;
		info!(chunks = self.chunks, path = %path.display(), "sparse index written");
		Ok(())
	}
}
