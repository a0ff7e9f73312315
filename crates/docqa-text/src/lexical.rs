//! Okapi BM25 over the ingested chunk set.
//!
//! Same weighting as the common `BM25Okapi` formulation: `k1 = 1.5`,
//! `b = 0.75`, IDF `ln(N - df + 0.5) - ln(df + 0.5)` with negative IDFs
//! replaced by `EPSILON * mean_idf`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use docqa_core::types::{Chunk, ChunkMetadata, LexicalScore};

use crate::analyzer::LexicalAnalyzer;

pub const K1: f64 = 1.5;
pub const B: f64 = 0.75;
pub const EPSILON: f64 = 0.25;

/// Term statistics derived from the tokenized corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bm25Stats {
	pub doc_lengths: Vec<u32>,
	pub avg_doc_len: f64,
	pub term_freqs: Vec<BTreeMap<String, u32>>,
	pub idf: BTreeMap<String, f64>,
}

impl Bm25Stats {
	pub fn build(docs: &[Vec<String>]) -> Self {
		let mut doc_lengths = Vec::with_capacity(docs.len());
		let mut term_freqs = Vec::with_capacity(docs.len());
		let mut doc_freq: BTreeMap<String, u32> = BTreeMap::new();
		let mut total = 0u64;
		for tokens in docs {
			let mut tf: BTreeMap<String, u32> = BTreeMap::new();
			for t in tokens {
				*tf.entry(t.clone()).or_default() += 1;
			}
			for term in tf.keys() {
				*doc_freq.entry(term.clone()).or_default() += 1;
			}
			total += tokens.len() as u64;
			doc_lengths.push(tokens.len() as u32);
			term_freqs.push(tf);
		}
		let n = docs.len() as f64;
		let avg_doc_len = if docs.is_empty() { 0.0 } else { total as f64 / n };

		let mut idf = BTreeMap::new();
		let mut idf_sum = 0.0;
		let mut negative = BTreeSet::new();
		for (term, df) in doc_freq {
			let df = f64::from(df);
			let value = (n - df + 0.5).ln() - (df + 0.5).ln();
			idf_sum += value;
			if value < 0.0 {
				negative.insert(term.clone());
			}
			idf.insert(term, value);
		}
		if !idf.is_empty() {
			let floor = EPSILON * idf_sum / idf.len() as f64;
			for term in negative {
				idf.insert(term, floor);
			}
		}
		Self { doc_lengths, avg_doc_len, term_freqs, idf }
	}

	pub fn len(&self) -> usize { self.doc_lengths.len() }

	pub fn is_empty(&self) -> bool { self.doc_lengths.is_empty() }

	/// One score per document, in insertion order. Repeated query tokens
	/// count once per occurrence; unknown tokens contribute nothing.
	pub fn score(&self, query_tokens: &[String]) -> Vec<f64> {
		let mut scores = vec![0.0; self.len()];
		for q in query_tokens {
			let Some(&idf) = self.idf.get(q) else { continue };
			for (i, tf) in self.term_freqs.iter().enumerate() {
				let Some(&f) = tf.get(q) else { continue };
				let f = f64::from(f);
				let len_ratio = if self.avg_doc_len > 0.0 { f64::from(self.doc_lengths[i]) / self.avg_doc_len } else { 1.0 };
				scores[i] += idf * (f * (K1 + 1.0)) / (f + K1 * (1.0 - B + B * len_ratio));
			}
		}
		scores
	}
}

/// Chunk texts and metadatas (parallel arrays) plus their BM25 statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalIndex {
	pub(crate) texts: Vec<String>,
	pub(crate) metadatas: Vec<ChunkMetadata>,
	pub(crate) stats: Bm25Stats,
}

impl LexicalIndex {
	pub fn build(chunks: &[Chunk]) -> Self {
		let mut analyzer = LexicalAnalyzer::new();
		let tokenized: Vec<Vec<String>> = chunks.iter().map(|c| analyzer.tokenize(&c.text)).collect();
		Self {
			texts: chunks.iter().map(|c| c.text.clone()).collect(),
			metadatas: chunks.iter().map(|c| c.metadata.clone()).collect(),
			stats: Bm25Stats::build(&tokenized),
		}
	}

	pub fn len(&self) -> usize { self.texts.len() }

	pub fn is_empty(&self) -> bool { self.texts.is_empty() }

	pub fn stats(&self) -> &Bm25Stats { &self.stats }

	pub fn chunk(&self, index: usize) -> Option<Chunk> {
		let text = self.texts.get(index)?;
		let metadata = self.metadatas.get(index)?;
		Some(Chunk::new(text.clone(), metadata.clone()))
	}

	pub fn score(&self, query: &str) -> Vec<LexicalScore> {
		let tokens = LexicalAnalyzer::new().tokenize(query);
		self.stats.score(&tokens).into_iter().map(LexicalScore).collect()
	}

	/// The `k` best `(chunk index, score)` pairs; ties keep insertion order.
	pub fn top_k(&self, query: &str, k: usize) -> Vec<(usize, LexicalScore)> {
		let mut ranked: Vec<(usize, LexicalScore)> = self.score(query).into_iter().enumerate().collect();
		ranked.sort_by(|a, b| b.1 .0.total_cmp(&a.1 .0));
		ranked.truncate(k);
		ranked
	}
}
