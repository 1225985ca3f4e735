//! Utility modules.

pub mod file;
pub mod retry;

pub use file::{calculate_checksum, read_file_content};
pub use retry::{RetryConfig, RetryResult, Retryable, with_retry};
