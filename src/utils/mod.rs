//! Utility modules.

pub mod file;
pub mod guard;
pub mod retry;

pub use file::{calculate_checksum, decode_text, read_text_document};
pub use guard::CallGuard;
pub use retry::{RetryConfig, Retryable, with_retry};
