mod common;

use std::fs;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{chunk, AxisEmbedder, CannedGenerator, MemoryDense, NoOcr, OverlapScorer};
use docqa_core::config::Settings;
use docqa_core::error::{Error, IndexKind};
use docqa_core::loader::DocumentLoader;
use docqa_core::traits::{DenseIndex, Embedder, PairScorer};
use docqa_core::types::{Chunk, FusedScore};
use docqa_embed::HashEmbedder;
use docqa_hybrid::fusion::RankFuser;
use docqa_hybrid::{heuristic_classify, HybridRetriever, Ingestor, OllamaGenerator, QueryClassifier, QueryIntent, Reranker};
use docqa_text::LexicalIndex;
use docqa_vector::LanceDenseIndex;
use proptest::prelude::*;
use tempfile::TempDir;

fn alpha_zeta_corpus() -> Vec<Chunk> {
    vec![
        chunk("alpha one two three four five six", 0),
        chunk("zeta zeta", 1),
        chunk("other words here", 2),
    ]
}

fn retriever_over(chunks: &[Chunk]) -> HybridRetriever {
    let embedder = AxisEmbedder;
    let dense = MemoryDense::default();
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed_batch(&texts).expect("embed");
    dense.rebuild(chunks, &vectors).expect("rebuild");
    HybridRetriever::new(Box::new(embedder), Box::new(dense), LexicalIndex::build(chunks), 60)
}

#[test]
fn top_dense_and_top_sparse_hits_fuse_to_equal_scores() {
    let corpus = alpha_zeta_corpus();
    let retriever = retriever_over(&corpus);
    let fused = retriever.fused_candidates("alpha zeta", 1).expect("fuse");
    assert_eq!(fused.len(), 2);
    let texts: Vec<&str> = fused.iter().map(|r| r.chunk.text.as_str()).collect();
    assert!(texts.contains(&corpus[0].text.as_str()));
    assert!(texts.contains(&corpus[1].text.as_str()));
    for r in &fused {
        assert_eq!(r.score, FusedScore(1.0 / 61.0));
    }
}

#[test]
fn retrieve_keeps_only_the_top_k_fused_chunks() {
    let corpus = alpha_zeta_corpus();
    let retriever = retriever_over(&corpus);
    let chunks = retriever.retrieve("alpha zeta", 1).expect("retrieve");
    assert_eq!(chunks.len(), 1);
    let fused = retriever.fused_candidates("alpha zeta", 1).expect("fuse");
    assert_eq!(fused.len(), 2);
    assert_eq!(chunks[0], fused[0].chunk);
}

#[test]
fn zero_top_k_is_invalid_input() {
    let retriever = retriever_over(&alpha_zeta_corpus());
    assert!(matches!(retriever.retrieve("alpha", 0), Err(Error::InvalidInput(_))));
}

#[test]
fn unbuilt_dense_index_surfaces_as_not_initialized() {
    let corpus = alpha_zeta_corpus();
    let retriever = HybridRetriever::new(Box::new(AxisEmbedder), Box::new(MemoryDense::default()), LexicalIndex::build(&corpus), 60);
    let err = retriever.retrieve("alpha", 2).expect_err("no dense index");
    assert!(matches!(err, Error::IndexNotInitialized { kind: IndexKind::Dense, .. }));
}

#[test]
fn opening_without_ingestion_is_not_initialized() {
    let tmp = TempDir::new().expect("tmp");
    let mut settings = Settings::default();
    settings.index.sparse_path = tmp.path().join("bm25_index.json").to_string_lossy().to_string();
    settings.index.dense_dir = tmp.path().join("lancedb").to_string_lossy().to_string();
    let err = HybridRetriever::open(&settings, Box::new(HashEmbedder::new(32))).err().expect("must fail");
    assert!(matches!(err, Error::IndexNotInitialized { kind: IndexKind::Sparse, .. }));
}

#[test]
fn empty_candidates_never_touch_the_model() {
    let scorer = Arc::new(OverlapScorer::default());
    let reranker = Reranker::with_scorer(scorer.clone());
    assert!(reranker.rerank("anything", &[], 3).expect("rerank").is_empty());
    assert!(reranker.rerank("anything", &[], 0).expect("empty wins over top_n").is_empty());
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    assert!(matches!(reranker.rerank("anything", &[chunk("a", 0)], 0), Err(Error::InvalidInput(_))));

    let loads = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = loads.clone();
    let lazy = Reranker::with_loader(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(OverlapScorer::default()) as Arc<dyn PairScorer>)
    });
    assert!(lazy.rerank("anything", &[], 3).expect("rerank").is_empty());
    assert_eq!(loads.load(Ordering::SeqCst), 0);
}

#[test]
fn top_n_beyond_candidates_returns_all_sorted() {
    let reranker = Reranker::with_scorer(Arc::new(OverlapScorer::default()));
    let candidates = vec![chunk("nothing relevant", 0), chunk("entropy of a coin", 1), chunk("entropy coin flip", 2)];
    let out = reranker.rerank("entropy coin flip", &candidates, 10).expect("rerank");
    let texts: Vec<&str> = out.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["entropy coin flip", "entropy of a coin", "nothing relevant"]);

    let top = reranker.rerank("entropy coin flip", &candidates, 1).expect("rerank");
    assert_eq!(top, vec![candidates[2].clone()]);
}

#[test]
fn model_loads_once_and_failures_are_typed() {
    let loads = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = loads.clone();
    let reranker = Reranker::with_loader(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(OverlapScorer::default()) as Arc<dyn PairScorer>)
    });
    let candidates = vec![chunk("a b", 0)];
    reranker.rerank("a", &candidates, 1).expect("first");
    reranker.rerank("b", &candidates, 1).expect("second");
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    let broken = Reranker::with_loader(|| Err(Error::ModelUnavailable("no checkpoint".into())));
    assert!(matches!(broken.rerank("a", &candidates, 1), Err(Error::ModelUnavailable(_))));
}

#[test]
fn heuristic_labels() {
    assert_eq!(heuristic_classify("Why does gradient descent converge?"), QueryIntent::Conceptual);
    assert_eq!(heuristic_classify("What is the formula for entropy?"), QueryIntent::Factual);
    assert_eq!(heuristic_classify("Compare L1 and L2 regularization tradeoffs"), QueryIntent::Exploratory);
    assert_eq!(heuristic_classify("Backpropagation through time"), QueryIntent::Conceptual);
}

#[test]
fn generator_label_is_trimmed_and_lowercased() {
    let classifier = QueryClassifier::new(Box::new(CannedGenerator(Ok("  Exploratory\n".into()))));
    assert_eq!(classifier.classify("Why is the sky blue?"), QueryIntent::Exploratory);
}

#[test]
fn chatty_or_failed_generator_falls_back_to_keywords() {
    let chatty = QueryClassifier::new(Box::new(CannedGenerator(Ok("I would say factual.".into()))));
    assert_eq!(chatty.classify("Compare SGD and Adam"), QueryIntent::Exploratory);

    let down = QueryClassifier::new(Box::new(CannedGenerator(Err(Error::Timeout("slow".into())))));
    assert_eq!(down.classify("What is a tensor?"), QueryIntent::Factual);
}

#[test]
fn unreachable_ollama_falls_back_to_keywords() {
    let mut settings = Settings::default();
    settings.generator.base_url = "http://127.0.0.1:1".into();
    settings.generator.timeout_secs = 2;
    let classifier = QueryClassifier::new(Box::new(OllamaGenerator::new(&settings.generator).expect("client")));
    assert_eq!(classifier.classify("Define overfitting"), QueryIntent::Factual);
}

#[test]
fn ingestion_reports_skips_and_failures_then_queries_deterministically() {
    let tmp = TempDir::new().expect("tmp");
    let source = tmp.path().join("source");
    fs::create_dir_all(&source).expect("mkdir");
    fs::write(source.join("entropy.md"), "Entropy measures uncertainty. Cross entropy compares two distributions.").expect("write");
    fs::write(source.join("sgd.txt"), "Gradient descent follows the negative gradient. The learning rate sets the step.").expect("write");
    fs::write(source.join("grades.csv"), "a,b\n1,2\n").expect("write");
    fs::write(source.join("whiteboard.png"), [0u8; 8]).expect("write");

    let mut settings = Settings::default();
    settings.index.dense_dir = tmp.path().join("lancedb").to_string_lossy().to_string();
    settings.index.sparse_path = tmp.path().join("bm25_index.json").to_string_lossy().to_string();

    let embedder = HashEmbedder::new(64);
    let ingest = |settings: &Settings| {
        let dense = LanceDenseIndex::new(&settings.dense_dir(), embedder.model_id(), embedder.dim()).expect("dense");
        Ingestor::new(&embedder, &dense, settings.sparse_path(), settings.chunking.clone())
            .with_loader(DocumentLoader::new(Box::new(NoOcr)))
            .run(&source)
            .expect("ingest")
    };

    let report = ingest(&settings);
    assert_eq!(report.files_ingested, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].path.ends_with("whiteboard.png"));
    assert!(report.chunks >= 2);

    let first = HybridRetriever::open(&settings, Box::new(HashEmbedder::new(64)))
        .expect("open")
        .retrieve("gradient learning rate", 3)
        .expect("retrieve");
    assert!(!first.is_empty());
    assert!(first.iter().any(|c| c.metadata.source_path.ends_with("sgd.txt")));

    ingest(&settings);
    let second = HybridRetriever::open(&settings, Box::new(HashEmbedder::new(64)))
        .expect("open")
        .retrieve("gradient learning rate", 3)
        .expect("retrieve");
    assert_eq!(first, second);
}

#[test]
fn unwritable_sparse_path_leaves_dense_index_untouched() {
    let tmp = TempDir::new().expect("tmp");
    let source = tmp.path().join("source");
    fs::create_dir_all(&source).expect("mkdir");
    fs::write(source.join("notes.txt"), "Alpha notes about zeta. Beta notes follow.").expect("write");
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, "not a directory").expect("write");

    let embedder = AxisEmbedder;
    let dense = MemoryDense::default();
    let result = Ingestor::new(&embedder, &dense, blocker.join("bm25.json"), Settings::default().chunking)
        .with_loader(DocumentLoader::new(Box::new(NoOcr)))
        .run(&source);
    assert!(result.is_err());
    assert!(matches!(
        dense.similarity_search(&[1.0, 0.0, 0.0], 1),
        Err(Error::IndexNotInitialized { kind: IndexKind::Dense, .. })
    ));
}

fn labelled(prefix: &str, n: usize) -> Vec<Chunk> {
    (0..n).map(|i| chunk(&format!("{prefix} {i}"), i)).collect()
}

proptest! {
    #[test]
    fn strong_in_one_list_beats_weak_in_both_halves(n in 2usize..40, k in 1u32..100) {
        let dense = labelled("dense", n);
        let sparse = labelled("sparse", n);
        let fused = RankFuser::new(k).fuse(&[&dense, &sparse]);
        prop_assert_eq!(fused.len(), 2 * n);
        let top = fused.iter().find(|r| r.chunk == dense[0]).map(|r| r.score.0).unwrap_or_default();
        for r in &fused {
            let rank = dense.iter().chain(sparse.iter()).position(|c| *c == r.chunk).map(|p| p % n + 1).unwrap_or_default();
            if rank > n / 2 {
                prop_assert!(top > r.score.0);
            }
        }
    }

    #[test]
    fn rank_one_in_both_outranks_rank_one_in_one(n in 1usize..20) {
        let shared = chunk("shared", 99);
        let mut dense = labelled("dense", n);
        let mut sparse = labelled("sparse", n);
        dense.insert(0, shared.clone());
        sparse.insert(0, shared.clone());
        let fused = RankFuser::default().fuse(&[&dense, &sparse]);
        prop_assert_eq!(&fused[0].chunk, &shared);
        prop_assert!(fused[0].score.0 > fused[1].score.0);
    }

    #[test]
    fn relabeling_metadata_keeps_duplicate_structure(
        texts in prop::collection::vec("[a-c]{1,2}", 1..12),
        picks in prop::collection::vec(0usize..12, 1..12),
        offset in 1usize..1000,
    ) {
        let base: Vec<Chunk> = texts.iter().enumerate().map(|(i, t)| chunk(t, i)).collect();
        let other: Vec<Chunk> = picks.iter().map(|p| base[p % base.len()].clone()).collect();
        let relabel = |c: &Chunk| {
            let mut c = c.clone();
            c.metadata.chunk_index += offset;
            c.metadata.source_path = format!("/moved{}", c.metadata.source_path);
            c
        };
        let base2: Vec<Chunk> = base.iter().map(relabel).collect();
        let other2: Vec<Chunk> = other.iter().map(relabel).collect();
        let a = RankFuser::default().fuse(&[&base, &other]);
        let b = RankFuser::default().fuse(&[&base2, &other2]);
        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert_eq!(&relabel(&x.chunk), &y.chunk);
            prop_assert_eq!(x.score, y.score);
        }
    }
}
