//! Ask command implementation.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::qa::RetrievalQa;
use crate::services::{OllamaClient, VectorIndex};

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, help = "Directory of indexed documents")]
    pub dir: PathBuf,

    #[arg(required = true, help = "Question to ask")]
    pub question: String,
}

pub async fn handle_ask(args: AskArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let question = args.question.trim();
    if question.is_empty() {
        anyhow::bail!("question cannot be empty");
    }

    let config = Config::load_or_default();
    let formatter = get_formatter(format);
    let client = OllamaClient::new(&config.ollama)?;

    // Reuse a persisted index when one exists; otherwise extract, embed,
    // and persist one for this directory.
    let index = VectorIndex::build_or_load(&args.dir, &config, &client)
        .await
        .with_context(|| format!("failed to index {}", args.dir.display()))?;

    if verbose {
        eprintln!("Index: {} chunks", index.len());
    }

    let qa = RetrievalQa::new(&index, &client, &client, config.query.top_k as usize);
    let answer = qa.answer(question, &mut std::io::stdout()).await;

    print!("{}", formatter.format_answer(&answer));
    Ok(())
}
