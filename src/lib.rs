//! Question answering over a directory of local documents.
//!
//! Text is extracted from PDF, plain-text, CSV, and slide-deck files,
//! split into overlapping chunks, and embedded with a local Ollama server.
//! The resulting vector index is persisted next to the documents and
//! queried with retrieval-augmented generation, citing the files (and
//! slides) each answer drew from.

pub mod cli;
pub mod error;
pub mod extract;
pub mod models;
pub mod services;
pub mod utils;

pub use error::AppError;
