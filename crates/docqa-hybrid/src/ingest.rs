//! Ingestion: load, chunk, embed, then rebuild both indexes.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use docqa_core::chunking::SemanticChunker;
use docqa_core::config::ChunkingSettings;
use docqa_core::error::{Error, Result};
use docqa_core::loader::{DocumentLoader, FileFailure};
use docqa_core::traits::{DenseIndex, Embedder};
use docqa_core::types::Chunk;
use docqa_text::LexicalIndex;

const EMBED_BATCH: usize = 64;

/// What happened to each file of the source tree.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub files_ingested: usize,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<FileFailure>,
    pub chunks: usize,
}

pub struct Ingestor<'a> {
    loader: DocumentLoader,
    embedder: &'a dyn Embedder,
    dense: &'a dyn DenseIndex,
    sparse_path: PathBuf,
    chunking: ChunkingSettings,
}

impl<'a> Ingestor<'a> {
    pub fn new(embedder: &'a dyn Embedder, dense: &'a dyn DenseIndex, sparse_path: impl Into<PathBuf>, chunking: ChunkingSettings) -> Self {
        Self { loader: DocumentLoader::default(), embedder, dense, sparse_path: sparse_path.into(), chunking }
    }

    pub fn with_loader(mut self, loader: DocumentLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Rebuild both indexes from `source`. Previous index contents are
    /// replaced, not merged.
    pub fn run(&self, source: &Path) -> Result<IngestReport> {
        let outcome = self.loader.load_dir(source)?;
        let chunker = SemanticChunker::from_settings(self.embedder, &self.chunking);
        let mut report = IngestReport { skipped: outcome.skipped, failed: outcome.failed, ..Default::default() };
        let mut chunks: Vec<Chunk> = Vec::new();
        for doc in &outcome.documents {
            match chunker.chunk_document(doc) {
                Ok(doc_chunks) => {
                    report.files_ingested += 1;
                    chunks.extend(doc_chunks);
                }
                Err(e) => {
                    warn!(path = %doc.path.display(), error = %e, "failed to chunk document");
                    report.failed.push(FileFailure { path: doc.path.clone(), reason: e.to_string() });
                }
            }
        }

        let embeddings = self.embed_chunks(&chunks)?;
        // The sparse blob is fully written before the dense store is dropped,
        // so a write failure leaves both previous indexes in place.
        let staged = LexicalIndex::build(&chunks).stage(&self.sparse_path)?;
        self.dense.rebuild(&chunks, &embeddings)?;
        staged.commit()?;
        report.chunks = chunks.len();
        info!(
            files = report.files_ingested,
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            chunks = report.chunks,
            "ingestion complete"
        );
        Ok(report)
    }

    fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let pb = ProgressBar::new(chunks.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} embedded") {
            pb.set_style(style.progress_chars("#>-"));
        }
        let mut out = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts)?;
            if vectors.len() != batch.len() {
                return Err(Error::Operation(format!("embedder returned {} vectors for {} chunks", vectors.len(), batch.len())));
            }
            out.extend(vectors);
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        Ok(out)
    }
}
