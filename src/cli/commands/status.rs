//! Status command implementation.

use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::error::ConfigError;
use crate::models::{Config, OutputFormat};
use crate::services::OllamaClient;

pub async fn handle_status(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load_or_default();
    let formatter = get_formatter(format);

    let client = OllamaClient::new(&config.ollama)?;
    let (reachable, missing) = match client.check_models().await {
        Ok(()) => (true, Vec::new()),
        Err(ConfigError::MissingModels(models)) => (true, models),
        Err(e) => {
            if verbose {
                eprintln!("Ollama check failed: {}", e);
            }
            (false, Vec::new())
        }
    };

    let status = StatusInfo {
        ollama_url: config.ollama.url.clone(),
        ollama_reachable: reachable,
        llm_model: config.ollama.llm_model.clone(),
        embedding_model: config.ollama.embedding_model.clone(),
        models_missing: missing,
        config_path: Config::config_path().map(|p| p.display().to_string()),
    };

    print!("{}", formatter.format_status(&status));
    Ok(())
}
