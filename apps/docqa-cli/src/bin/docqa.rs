use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use docqa_core::config::{Config, Settings};
use docqa_core::types::Chunk;
use docqa_embed::get_default_embedder;
use docqa_hybrid::{format_context, HybridRetriever, Ingestor, OllamaGenerator, QueryClassifier, Reranker};
use docqa_vector::LanceDenseIndex;

/// Hybrid retrieval over an ingested document corpus
#[derive(Parser)]
#[command(name = "docqa", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the dense and sparse indexes from a source directory
    Ingest {
        /// Source directory (defaults to data.source_dir)
        #[arg(long, value_name = "DIR")]
        source: Option<PathBuf>,
    },

    /// Retrieve, fuse and rerank context chunks for a question
    Query {
        text: String,

        /// Hits taken from each retriever (defaults to retrieval.top_k)
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the fused order without reranking
        #[arg(long)]
        no_rerank: bool,
    },

    /// Label a question as conceptual, factual or exploratory
    Classify {
        text: String,

        /// Skip the generator and use keyword matching only
        #[arg(long)]
        heuristic: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let settings = Config::load().context("loading configuration")?.settings()?;

    match cli.command {
        Commands::Ingest { source } => ingest(&settings, source),
        Commands::Query { text, top_k, no_rerank } => query(&settings, &text, top_k, no_rerank),
        Commands::Classify { text, heuristic } => {
            let classifier = if heuristic {
                QueryClassifier::heuristic()
            } else {
                QueryClassifier::new(Box::new(OllamaGenerator::new(&settings.generator)?))
            };
            println!("{}", classifier.classify(&text));
            Ok(())
        }
    }
}

fn ingest(settings: &Settings, source: Option<PathBuf>) -> anyhow::Result<()> {
    let source = source.unwrap_or_else(|| settings.source_dir());
    let embedder = get_default_embedder(settings)?;
    let dense = LanceDenseIndex::new(&settings.dense_dir(), embedder.model_id(), embedder.dim())?;
    let report = Ingestor::new(embedder.as_ref(), &dense, settings.sparse_path(), settings.chunking.clone()).run(&source)?;

    println!("Ingested {} files into {} chunks from {}", report.files_ingested, report.chunks, source.display());
    if !report.skipped.is_empty() {
        println!("Skipped {} files with unrecognized extensions", report.skipped.len());
    }
    for failure in &report.failed {
        println!("Failed: {} ({})", failure.path.display(), failure.reason);
    }
    Ok(())
}

fn query(settings: &Settings, text: &str, top_k: Option<usize>, no_rerank: bool) -> anyhow::Result<()> {
    let top_k = top_k.unwrap_or(settings.retrieval.top_k);
    let limit = settings.retrieval.max_context_chunks;
    let retriever = HybridRetriever::open(settings, get_default_embedder(settings)?)?;
    let fused = retriever.retrieve(text, top_k)?;

    let chunks: Vec<Chunk> = if no_rerank {
        fused.into_iter().take(limit).collect()
    } else {
        match Reranker::create(settings).rerank(text, &fused, limit) {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(error = %e, "reranking failed; using fused order");
                fused.into_iter().take(limit).collect()
            }
        }
    };

    if chunks.is_empty() {
        println!("No matching chunks.");
    } else {
        println!("{}", format_context(&chunks));
    }
    Ok(())
}
