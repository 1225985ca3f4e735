//! CLI module for the document QA CLI.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Question answering over a directory of local documents.
#[derive(Debug, Parser)]
#[command(name = "docqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build or rebuild the index for a document directory
    Index(commands::IndexArgs),

    /// Ask a single question about an indexed directory
    Ask(commands::AskArgs),

    /// Interactive question answering session
    Chat(commands::ChatArgs),

    /// List the indexed chunks of a directory
    Chunks(commands::ChunksArgs),

    /// Check Ollama connectivity, required models, and configuration
    Status,
}
