//! Content-addressed, deduplicated per-file checkpoint store with bounded
//! retention, plus line-level diff statistics.

mod diffstat;
mod store;

pub use diffstat::{diff_stats, DiffStats};
pub use store::{CheckpointRecord, CheckpointStore, CreatedCheckpoint};
