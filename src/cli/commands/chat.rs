//! Chat command implementation: an interactive question loop.

use anyhow::{Context, Result};
use clap::Args;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::qa::RetrievalQa;
use crate::services::{OllamaClient, VectorIndex};

#[derive(Debug, Args)]
pub struct ChatArgs {
    #[arg(required = true, help = "Directory of indexed documents")]
    pub dir: PathBuf,
}

pub async fn handle_chat(args: ChatArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load_or_default();
    let formatter = get_formatter(format);

    let client = OllamaClient::new(&config.ollama)?;
    let index = VectorIndex::build_or_load(&args.dir, &config, &client)
        .await
        .with_context(|| format!("failed to index {}", args.dir.display()))?;

    let qa = RetrievalQa::new(&index, &client, &client, config.query.top_k as usize);

    if verbose {
        eprintln!("Index: {} chunks", index.len());
    }
    println!("Ask questions about {} ('chunk' lists chunks, 'exit' quits)", args.dir.display());

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("Question: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let query = line.trim();

        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") {
            break;
        }
        let answer = qa.answer(query, &mut std::io::stdout()).await;
        print!("{}", formatter.format_answer(&answer));
        println!();
    }

    Ok(())
}
