//! Index command implementation.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::cli::output::{IndexStats, get_formatter};
use crate::extract::load_documents;
use crate::models::{Config, OutputFormat};
use crate::services::{OllamaClient, TextChunker, VectorIndex};

#[derive(Debug, Args)]
pub struct IndexArgs {
    #[arg(required = true, help = "Directory of documents to index")]
    pub dir: PathBuf,
}

pub async fn handle_index(args: IndexArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load_or_default();
    let formatter = get_formatter(format);
    let start = Instant::now();

    let client = OllamaClient::new(&config.ollama)?;
    client
        .check_models()
        .await
        .context("Ollama is not ready")?;

    let documents = load_documents(&args.dir, &config.indexing).await;
    if verbose {
        eprintln!("Loaded {} documents from {}", documents.len(), args.dir.display());
    }

    let chunker = TextChunker::new(&config.indexing);
    let chunks = chunker.chunk_all(&documents);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("invalid progress template")?,
    );
    pb.set_message(format!("Embedding {} chunks", chunks.len()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let document_count = documents.len() as u64;
    let index = VectorIndex::build(chunks, &client)
        .await
        .context("failed to build index")?;
    index.save(&args.dir).context("failed to save index")?;
    pb.finish_and_clear();

    let stats = IndexStats {
        documents: document_count,
        chunks: index.len() as u64,
        dimension: index.dimension() as u64,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    print!("{}", formatter.format_index_stats(&stats));

    Ok(())
}
