//! Sentence splitting and embedding-driven semantic chunking.
//!
//! Sentences are grouped greedily: a chunk is closed when the next sentence
//! drifts away from its predecessor (cosine below the threshold) or would push
//! the chunk past the word ceiling. Sentences are never split.

use tracing::debug;

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};
use crate::loader::LoadedDocument;
use crate::traits::Embedder;
use crate::types::{Chunk, ChunkMetadata};

/// Split on `.`, `!` or `?` followed by whitespace. The punctuation stays with
/// the sentence it ends; empty or blank input yields nothing.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let end = i + c.len_utf8();
        let mut next_start = None;
        while let Some(&(j, w)) = chars.peek() {
            if !w.is_whitespace() {
                break;
            }
            next_start = Some(j + w.len_utf8());
            chars.next();
        }
        if let Some(next) = next_start {
            sentences.push(text[start..end].to_string());
            start = next;
        }
    }
    if start < text.len() {
        sentences.push(text[start..].to_string());
    }
    sentences
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Cosine similarity; zero vectors compare as 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0f32;
    let mut na = 0f32;
    let mut nb = 0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

pub struct SemanticChunker<'a> {
    embedder: &'a dyn Embedder,
    max_words: usize,
    similarity_threshold: f32,
}

impl<'a> SemanticChunker<'a> {
    pub fn new(embedder: &'a dyn Embedder, max_words: usize, similarity_threshold: f32) -> Self {
        Self { embedder, max_words, similarity_threshold }
    }

    pub fn from_settings(embedder: &'a dyn Embedder, settings: &ChunkingSettings) -> Self {
        Self::new(embedder, settings.max_words, settings.similarity_threshold)
    }

    /// Group sentences into chunks, preserving order. Every input sentence
    /// appears in exactly one group.
    pub fn chunk_groups(&self, sentences: &[String]) -> Result<Vec<Vec<String>>> {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self.embedder.embed_batch(sentences)?;
        if embeddings.len() != sentences.len() {
            return Err(Error::Operation(format!(
                "embedder returned {} vectors for {} sentences",
                embeddings.len(),
                sentences.len()
            )));
        }

        let mut groups = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_words = 0usize;
        for (i, sentence) in sentences.iter().enumerate() {
            let words = word_count(sentence);
            if !current.is_empty() {
                let sim = cosine_similarity(&embeddings[i - 1], &embeddings[i]);
                if sim < self.similarity_threshold || current_words + words > self.max_words {
                    groups.push(std::mem::take(&mut current));
                    current_words = 0;
                }
            }
            current.push(sentence.clone());
            current_words += words;
        }
        if !current.is_empty() {
            groups.push(current);
        }
        debug!(sentences = sentences.len(), chunks = groups.len(), "semantic chunking done");
        Ok(groups)
    }

    /// Chunk texts; the position in the returned vector is the chunk index.
    pub fn chunk(&self, sentences: &[String]) -> Result<Vec<String>> {
        Ok(self
            .chunk_groups(sentences)?
            .into_iter()
            .map(|group| group.join(" ").trim().to_string())
            .collect())
    }

    /// Chunk every text unit of a document. `chunk_index` keeps counting across
    /// pages so it stays unique within the document.
    pub fn chunk_document(&self, doc: &LoadedDocument) -> Result<Vec<Chunk>> {
        let source_path = doc.path.to_string_lossy().to_string();
        let mut chunks = Vec::new();
        for unit in &doc.units {
            let sentences = split_sentences(&unit.text);
            for text in self.chunk(&sentences)? {
                let metadata = ChunkMetadata {
                    source_path: source_path.clone(),
                    page_number: unit.page_number,
                    chunk_index: chunks.len(),
                    ocr: unit.ocr.then_some(true),
                };
                chunks.push(Chunk::new(text, metadata));
            }
        }
        Ok(chunks)
    }
}
