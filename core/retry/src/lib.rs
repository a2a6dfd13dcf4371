//! Retry/backoff controller: classifies provider failures as retryable or
//! fatal, and computes exponential backoff delays with jitter.

mod backoff;
mod classify;

pub use backoff::BackoffController;
pub use classify::is_retryable;
