//! Engine-wide tunables. Construction-time dependency of the `Executor`,
//! never a process global.

use std::time::Duration;

/// All tunable constants for the iterative agent execution engine.
///
/// Every field has a sensible default; an embedder overrides only what it
/// cares about via `..Default::default()`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-file checkpoint retention. Default: 100.
    pub checkpoint_retention: usize,
    /// Large-content guard for checkpoint saves. Default: 5 MiB.
    pub checkpoint_max_content_bytes: usize,
    /// Grace window during which a decision for an already-terminal task
    /// returns `stale_request=true` instead of an error. Default: 10s.
    /// Deliberately distinct from `recently_completed_ttl`: a task can
    /// need a short decision-grace window without needing to stay in the
    /// recently-completed set nearly as long, or vice versa.
    pub stale_decision_grace: Duration,
    /// How long a task-id lingers in the recently-completed set before the
    /// registry prunes it. Default: 30s.
    pub recently_completed_ttl: Duration,
    /// Bound on context snapshots retained per task (default 20).
    pub context_snapshot_limit: usize,
    /// Maximum model-call attempts, including the first. Default: up to 5.
    pub retry_max_attempts: u32,
    /// Base delay for `base * 2^i` backoff.
    pub retry_base_delay: Duration,
    /// Fractional jitter applied on top of the exponential delay.
    pub retry_jitter_fraction: f64,
    /// Tools eligible for speculative auto-execution during streaming.
    pub auto_execute_allowlist: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            checkpoint_retention: 100,
            checkpoint_max_content_bytes: 5 * 1024 * 1024,
            stale_decision_grace: Duration::from_secs(10),
            recently_completed_ttl: Duration::from_secs(30),
            context_snapshot_limit: 20,
            retry_max_attempts: 5,
            retry_base_delay: Duration::from_secs(1),
            retry_jitter_fraction: 0.1,
            auto_execute_allowlist: vec!["file.write".to_string(), "file.edit".to_string()],
        }
    }
}

impl EngineConfig {
    pub fn is_auto_execute_eligible(&self, tool_name: &str) -> bool {
        self.auto_execute_allowlist.iter().any(|t| t == tool_name)
    }
}
