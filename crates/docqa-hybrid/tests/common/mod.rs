#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use docqa_core::error::{Error, IndexKind, Result};
use docqa_core::traits::{DenseIndex, Embedder, LabelGenerator, OcrEngine, PairScorer};
use docqa_core::types::{Chunk, ChunkMetadata, DenseDistance, Ranked};

pub fn chunk(text: &str, i: usize) -> Chunk {
    Chunk::new(text, ChunkMetadata { source_path: "/corpus/lecture.md".into(), page_number: None, chunk_index: i, ocr: None })
}

/// One-hot on the first of `alpha`/`beta` found in the text, axis 2 otherwise.
pub struct AxisEmbedder;

impl Embedder for AxisEmbedder {
    fn model_id(&self) -> &str {
        "axis"
    }

    fn dim(&self) -> usize {
        3
    }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let axis = if t.contains("alpha") {
                    0
                } else if t.contains("beta") {
                    1
                } else {
                    2
                };
                let mut v = vec![0.0; 3];
                v[axis] = 1.0;
                v
            })
            .collect())
    }
}

/// Brute-force L2 search over rows kept in memory.
#[derive(Default)]
pub struct MemoryDense {
    rows: Mutex<Option<Vec<(Chunk, Vec<f32>)>>>,
}

impl DenseIndex for MemoryDense {
    fn rebuild(&self, chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
        let rows = chunks.iter().cloned().zip(embeddings.iter().cloned()).collect();
        *self.rows.lock().expect("lock") = Some(rows);
        Ok(())
    }

    fn similarity_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<Ranked<DenseDistance>>> {
        let guard = self.rows.lock().expect("lock");
        let rows = guard.as_ref().ok_or_else(|| Error::not_initialized(IndexKind::Dense, "memory"))?;
        let mut hits: Vec<Ranked<DenseDistance>> = rows
            .iter()
            .map(|(c, v)| {
                let d: f32 = v.iter().zip(query_vec).map(|(a, b)| (a - b) * (a - b)).sum();
                Ranked::new(c.clone(), DenseDistance(d))
            })
            .collect();
        hits.sort_by(|a, b| a.score.0.total_cmp(&b.score.0));
        hits.truncate(k);
        Ok(hits)
    }
}

/// Scores a passage by how many query words it contains; counts calls.
#[derive(Default)]
pub struct OverlapScorer {
    pub calls: AtomicUsize,
}

impl PairScorer for OverlapScorer {
    fn score_pairs(&self, query: &str, passages: &[&str]) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(passages
            .iter()
            .map(|p| query.split_whitespace().filter(|w| p.contains(w)).count() as f32)
            .collect())
    }
}

pub struct CannedGenerator(pub Result<String>);

impl LabelGenerator for CannedGenerator {
    fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        match &self.0 {
            Ok(s) => Ok(s.clone()),
            Err(e) => Err(Error::Timeout(e.to_string())),
        }
    }
}

pub struct NoOcr;

impl OcrEngine for NoOcr {
    fn extract_text(&self, path: &Path) -> Result<String> {
        Err(Error::OcrUnavailable { path: path.to_path_buf(), reason: "tesseract not installed".into() })
    }
}
