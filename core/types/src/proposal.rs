//! Tool Call Proposal and Pre-Execution State.

use serde::{Deserialize, Serialize};

use crate::paramvalue::ParamMap;

/// Information captured when an auto-executed tool runs during streaming,
/// sufficient to drive a revert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreExecutionState {
    pub tool_name: String,
    /// Workspace-relative, posix-separated path.
    pub file_path: String,
    /// `None` if the file did not exist before the speculative mutation.
    pub original_content: Option<String>,
    /// The resolved parameters the auto-exec tool ran with: the single
    /// source of truth, never duplicated under a different field name.
    pub resolved_params: ParamMap,
    /// Directories created by the operation, innermost-first, for cleanup
    /// on revert.
    pub created_dirs: Vec<String>,
}

/// A parsed, not-yet-decided tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallProposal {
    pub call_id: String,
    pub tool_name: String,
    pub params: ParamMap,
    pub reason: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub description_snapshot: String,
    pub pre_executed: bool,
    pub pre_execution_state: Option<PreExecutionState>,
}

impl ToolCallProposal {
    pub fn new(call_id: impl Into<String>, tool_name: impl Into<String>, params: ParamMap, reason: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            params,
            reason: reason.into(),
            created_at: chrono::Utc::now(),
            description_snapshot: String::new(),
            pre_executed: false,
            pre_execution_state: None,
        }
    }

    pub fn with_pre_execution(mut self, state: PreExecutionState) -> Self {
        self.pre_executed = true;
        self.pre_execution_state = Some(state);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_proposal_has_no_pre_execution() {
        let p = ToolCallProposal::new("c1", "file.read", vec![], "need to inspect");
        assert!(!p.pre_executed);
        assert!(p.pre_execution_state.is_none());
    }

    #[test]
    fn pre_executed_proposal_carries_state() {
        let state = PreExecutionState {
            tool_name: "file.write".into(),
            file_path: "a.txt".into(),
            original_content: None,
            resolved_params: vec![],
            created_dirs: vec![],
        };
        let p = ToolCallProposal::new("c1", "file.write", vec![], "r").with_pre_execution(state);
        assert!(p.pre_executed);
        assert_eq!(
            p.pre_execution_state.unwrap().file_path,
            "a.txt"
        );
    }
}
