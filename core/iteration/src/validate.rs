//! Completion validation: a last check before letting the model declare
//! itself done.

use agentkit_types::TaskState;

/// Fixed feedback text sent back to the model when a `COMPLETE` is
/// rejected, directing it to propose the next tool call instead.
pub const COMPLETION_REJECTED_FEEDBACK: &str =
    "You cannot mark this task COMPLETE without having executed at least one tool call. Propose the next tool call and set AGENT_STATUS to AWAIT_TOOL.";

/// Whether `task` may transition to `completed` right now. Only the coder
/// domain enforces a minimum of one executed tool call; other domains
/// accept unconditionally.
pub fn validate_completion(task: &TaskState) -> Result<(), &'static str> {
    if task.domain_id == "coder" && task.history.is_empty() {
        return Err(COMPLETION_REJECTED_FEEDBACK);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_types::{ToolExecutionRecord, ParamMap};

    fn task(domain: &str) -> TaskState {
        TaskState::new("t1", "c1", domain, "a1", "do it", None)
    }

    fn record() -> ToolExecutionRecord {
        ToolExecutionRecord {
            call_id: "c1".into(),
            tool_name: "file.write".into(),
            params: ParamMap::new(),
            accepted: true,
            executed_at: chrono::Utc::now(),
            summary: "wrote a.txt".into(),
            result: serde_json::Value::Null,
            ops: vec![],
            error: None,
        }
    }

    #[test]
    fn coder_completion_rejected_with_no_tool_calls() {
        let t = task("coder");
        assert!(validate_completion(&t).is_err());
    }

    #[test]
    fn coder_completion_accepted_once_a_tool_ran() {
        let mut t = task("coder");
        t.record_history(record());
        assert!(validate_completion(&t).is_ok());
    }

    #[test]
    fn other_domains_accept_unconditionally() {
        let t = task("chat");
        assert!(validate_completion(&t).is_ok());
    }
}
