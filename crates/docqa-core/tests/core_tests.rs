use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use docqa_core::chunking::{split_sentences, word_count, SemanticChunker};
use docqa_core::error::{Error, Result};
use docqa_core::loader::{DocumentLoader, LoadedDocument, SourceFormat, TextUnit};
use docqa_core::traits::{Embedder, OcrEngine};
use proptest::prelude::*;
use tempfile::TempDir;

/// One-hot embedding keyed on the first letter of a sentence, so sentences
/// sharing a first letter are identical (cos = 1) and others orthogonal.
struct TopicEmbedder {
    calls: AtomicUsize,
}

impl TopicEmbedder {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }
}

impl Embedder for TopicEmbedder {
    fn model_id(&self) -> &str { "topic-test" }
    fn dim(&self) -> usize { 26 }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0f32; 26];
                let c = t.trim().chars().next().unwrap_or('a').to_ascii_lowercase();
                let idx = (c as usize).saturating_sub('a' as usize) % 26;
                v[idx] = 1.0;
                v
            })
            .collect())
    }
}

struct MissingOcr;

impl OcrEngine for MissingOcr {
    fn extract_text(&self, path: &Path) -> Result<String> {
        Err(Error::OcrUnavailable { path: path.to_path_buf(), reason: "not installed".into() })
    }
}

struct CannedOcr(&'static str);

impl OcrEngine for CannedOcr {
    fn extract_text(&self, _path: &Path) -> Result<String> {
        Ok(self.0.to_string())
    }
}

fn sentences(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn similar_neighbours_share_a_chunk() {
    let embedder = TopicEmbedder::new();
    let chunker = SemanticChunker::new(&embedder, 220, 0.72);
    let chunks = chunker
        .chunk(&sentences(&["apples are red.", "apricots are orange.", "bananas are yellow."]))
        .expect("chunk");
    assert_eq!(chunks, vec!["apples are red. apricots are orange.", "bananas are yellow."]);
}

#[test]
fn word_ceiling_closes_chunk() {
    let embedder = TopicEmbedder::new();
    let chunker = SemanticChunker::new(&embedder, 5, 0.72);
    let chunks = chunker
        .chunk(&sentences(&["a b c.", "a d e.", "a f."]))
        .expect("chunk");
    assert_eq!(chunks, vec!["a b c.", "a d e. a f."]);
}

#[test]
fn oversized_sentence_becomes_its_own_chunk() {
    let embedder = TopicEmbedder::new();
    let chunker = SemanticChunker::new(&embedder, 3, 0.0);
    let chunks = chunker
        .chunk(&sentences(&["a one two three four five.", "a six."]))
        .expect("chunk");
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0], "a one two three four five.");
}

#[test]
fn empty_input_does_not_call_the_embedder() {
    let embedder = TopicEmbedder::new();
    let chunker = SemanticChunker::new(&embedder, 220, 0.72);
    assert!(chunker.chunk(&[]).expect("chunk").is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn chunk_index_continues_across_pdf_pages() {
    let embedder = TopicEmbedder::new();
    let chunker = SemanticChunker::new(&embedder, 220, 0.72);
    let doc = LoadedDocument {
        path: "/corpus/book.pdf".into(),
        units: vec![
            TextUnit { text: "alpha one. beta two.".into(), page_number: Some(1), ocr: false },
            TextUnit { text: "gamma three.".into(), page_number: Some(2), ocr: false },
        ],
    };
    let chunks = chunker.chunk_document(&doc).expect("chunks");
    let indices: Vec<usize> = chunks.iter().map(|c| c.metadata.chunk_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert_eq!(chunks[2].metadata.page_number, Some(2));
    assert!(chunks.iter().all(|c| c.metadata.ocr.is_none()));
}

#[test]
fn loader_skips_unknown_extensions_and_records_failures() {
    let tmp = TempDir::new().expect("tmp");
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "Plain text. Two sentences.").expect("write");
    fs::create_dir_all(dir.join("notes")).expect("mkdir");
    fs::write(dir.join("notes/b.md"), "# Heading\n\nMarkdown body.").expect("write");
    fs::write(dir.join("data.csv"), "x,y").expect("write");
    fs::write(dir.join("scan.png"), [0u8, 1, 2]).expect("write");

    let loader = DocumentLoader::new(Box::new(MissingOcr));
    let outcome = loader.load_dir(dir).expect("load");

    assert_eq!(outcome.documents.len(), 2, "txt and md are loaded");
    assert_eq!(outcome.skipped.len(), 1, "csv is skipped");
    assert_eq!(outcome.failed.len(), 1, "png fails without OCR but does not abort");
    assert!(outcome.failed[0].reason.contains("OCR unavailable"));
}

#[test]
fn image_units_are_flagged_as_ocr() {
    let tmp = TempDir::new().expect("tmp");
    let img = tmp.path().join("scan.JPG");
    fs::write(&img, [0u8]).expect("write");
    let loader = DocumentLoader::new(Box::new(CannedOcr("Scanned words.")));
    let units = loader.load_file(&img, SourceFormat::from_path(&img).expect("image")).expect("units");
    assert_eq!(units, vec![TextUnit { text: "Scanned words.".into(), page_number: None, ocr: true }]);
}

#[test]
fn missing_source_dir_is_not_found() {
    let loader = DocumentLoader::new(Box::new(MissingOcr));
    let err = loader.load_dir(Path::new("/definitely/not/here")).expect_err("missing");
    assert!(matches!(err, Error::NotFound(_)));
}

fn sentence_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(("[abc]", 0usize..12), 0..30).prop_map(|items| {
        items
            .into_iter()
            .map(|(lead, extra)| {
                let mut words = vec![lead];
                words.extend((0..extra).map(|i| format!("w{i}")));
                format!("{}.", words.join(" "))
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn chunking_preserves_every_sentence(input in sentence_strategy(), max_words in 1usize..40) {
        let embedder = TopicEmbedder::new();
        let chunker = SemanticChunker::new(&embedder, max_words, 0.72);
        let groups = chunker.chunk_groups(&input).expect("groups");
        let flattened: Vec<String> = groups.iter().flatten().cloned().collect();
        prop_assert_eq!(flattened, input);
    }

    #[test]
    fn chunks_respect_word_ceiling(input in sentence_strategy(), max_words in 1usize..40) {
        let embedder = TopicEmbedder::new();
        let chunker = SemanticChunker::new(&embedder, max_words, 0.72);
        for group in chunker.chunk_groups(&input).expect("groups") {
            let words: usize = group.iter().map(|s| word_count(s)).sum();
            prop_assert!(words <= max_words || group.len() == 1);
        }
    }

    #[test]
    fn split_sentences_never_yields_blank(text in "[a-z .!?\n]{0,80}") {
        for s in split_sentences(&text) {
            prop_assert!(!s.trim().is_empty());
        }
    }
}
