//! Per-invocation context handed to a [`crate::Tool`].

use std::path::{Path, PathBuf};

use agentkit_error::CoreError;
use agentkit_types::ExecutionPlan;

/// Execution context for one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub workspace_path: Option<PathBuf>,
    /// The task's current plan, if any — read (and, for `plan.update`,
    /// cloned-and-mutated) by the plan tools.
    pub current_plan: Option<ExecutionPlan>,
}

impl ToolContext {
    pub fn new(workspace_path: Option<PathBuf>) -> Self {
        Self {
            workspace_path,
            current_plan: None,
        }
    }

    pub fn with_plan(mut self, plan: Option<ExecutionPlan>) -> Self {
        self.current_plan = plan;
        self
    }

    /// Resolve a tool-supplied path against the workspace root, refusing
    /// any path that would escape it. Returns the absolute path and its
    /// workspace-relative posix-style string.
    pub fn resolve(&self, relative: &str) -> Result<(PathBuf, String), CoreError> {
        let root = self
            .workspace_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let candidate = root.join(relative);
        let normalized = normalize(&candidate);
        let normalized_root = normalize(&root);
        if !normalized.starts_with(&normalized_root) {
            return Err(CoreError::WorkspaceEscape {
                path: relative.to_string(),
            });
        }
        let rel = normalized
            .strip_prefix(&normalized_root)
            .unwrap_or(&normalized)
            .to_string_lossy()
            .replace('\\', "/");
        Ok((normalized, rel))
    }
}

/// Lexical path normalization (no filesystem access, so it works for paths
/// that don't exist yet — e.g. a `file.write` target).
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                out.pop();
            }
            std::path::Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}
