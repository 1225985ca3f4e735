//! Legacy slide deck (.ppt) extractor.
//!
//! The binary format is not parsed directly. The file is converted to the
//! XML-based format with LibreOffice (`soffice --headless --convert-to pptx`)
//! and fed through the regular slide extractor. The converted file is a
//! temporary artifact and is removed once extraction finishes. Documents
//! carry the original `.ppt` path so citations point at a file that still
//! exists.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ConversionError, ExtractionError};
use crate::extract::pptx;
use crate::models::Document;

/// Extract one document per slide from a legacy deck.
pub async fn extract_ppt(path: &Path, timeout: Duration) -> Result<Vec<Document>, ExtractionError> {
    let source = path.to_string_lossy().to_string();
    let converted = convert_ppt(path, timeout).await?;
    pptx::extract_pptx_as(converted.path(), &source)
}

/// The converted file, deleted on drop.
struct ConvertedDeck {
    path: PathBuf,
}

impl ConvertedDeck {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ConvertedDeck {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove converted deck");
        }
        if let Some(parent) = self.path.parent() {
            // Best effort; fails while other conversions still occupy it.
            let _ = std::fs::remove_dir(parent);
        }
    }
}

/// Run the converter and return a guard around its output file.
///
/// Conversion happens in a scratch directory under the system temp dir, so
/// a sibling `.pptx` with the same stem is never overwritten.
async fn convert_ppt(path: &Path, timeout: Duration) -> Result<ConvertedDeck, ConversionError> {
    let outdir = std::env::temp_dir().join(format!("docqa-convert-{}", std::process::id()));
    std::fs::create_dir_all(&outdir)?;
    debug!(path = %path.display(), "converting legacy deck");

    let run = Command::new("soffice")
        .arg("--headless")
        .arg("--convert-to")
        .arg("pptx")
        .arg(path)
        .arg("--outdir")
        .arg(&outdir)
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, run)
        .await
        .map_err(|_| ConversionError::Timeout)??;

    if !output.status.success() {
        return Err(ConversionError::ExitStatus {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    // The converter names its output `<stem>.pptx`; the stem may itself
    // contain dots, so the extension is appended rather than swapped.
    let mut converted_name = path
        .file_stem()
        .ok_or_else(|| ConversionError::MissingOutput(path.to_string_lossy().to_string()))?
        .to_os_string();
    converted_name.push(".pptx");
    let converted = outdir.join(converted_name);
    if !converted.is_file() {
        return Err(ConversionError::MissingOutput(
            converted.to_string_lossy().to_string(),
        ));
    }

    Ok(ConvertedDeck { path: converted })
}
