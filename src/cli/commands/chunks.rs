//! Chunks command implementation.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::get_formatter;
use crate::models::OutputFormat;
use crate::services::VectorIndex;

#[derive(Debug, Args)]
pub struct ChunksArgs {
    #[arg(required = true, help = "Directory of indexed documents")]
    pub dir: PathBuf,
}

pub async fn handle_chunks(args: ChunksArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    let Some(index) = VectorIndex::open(&args.dir) else {
        anyhow::bail!(
            "no index found for {}; run 'docqa index' first",
            args.dir.display()
        );
    };

    print!("{}", formatter.format_chunks(index.records()));
    Ok(())
}
