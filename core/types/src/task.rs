//! Task State: one per active task, exclusively owned by the active task
//! registry.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::execution::ToolExecutionRecord;
use crate::plan::ExecutionPlan;
use crate::proposal::ToolCallProposal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    WaitingUser,
    AwaitContinuation,
    Completed,
    Failed,
    Aborted,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Aborted
        )
    }
}

/// A lightweight point-in-time snapshot appended after each iteration step,
/// bounded to the last N (default 20, see `EngineConfig`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub iteration: u64,
    pub status: TaskStatus,
    pub taken_at: chrono::DateTime<chrono::Utc>,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskState {
    // Immutable identity
    pub task_id: String,
    pub chat_id: String,
    pub domain_id: String,
    pub agent_id: String,
    pub user_request: String,
    pub workspace_path: Option<String>,

    // Evolving
    pub status: TaskStatus,
    pub iteration: u64,
    pub tool_call_counter: u64,
    pub agent_message: Option<String>,
    pub last_full_response: Option<String>,
    pub plan: Option<ExecutionPlan>,
    pub code_spec: Option<String>,
    pub pending: Vec<ToolCallProposal>,
    pub history: Vec<ToolExecutionRecord>,
    pub snapshots: VecDeque<ContextSnapshot>,
    /// Set when `AGENT_STATUS=COMPLETE` arrives together with tool calls:
    /// the closing message to use once every deferred tool has been
    /// decided and executed.
    pub deferred_completion_message: Option<String>,
    pub metadata: std::collections::BTreeMap<String, serde_json::Value>,
}

impl TaskState {
    pub fn new(
        task_id: impl Into<String>,
        chat_id: impl Into<String>,
        domain_id: impl Into<String>,
        agent_id: impl Into<String>,
        user_request: impl Into<String>,
        workspace_path: Option<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            chat_id: chat_id.into(),
            domain_id: domain_id.into(),
            agent_id: agent_id.into(),
            user_request: user_request.into(),
            workspace_path,
            status: TaskStatus::Running,
            iteration: 0,
            tool_call_counter: 0,
            agent_message: None,
            last_full_response: None,
            plan: None,
            code_spec: None,
            pending: Vec::new(),
            history: Vec::new(),
            snapshots: VecDeque::new(),
            deferred_completion_message: None,
            metadata: Default::default(),
        }
    }

    /// Append a snapshot, enforcing the bounded-retention invariant.
    pub fn push_snapshot(&mut self, note: impl Into<String>, limit: usize) {
        self.snapshots.push_back(ContextSnapshot {
            iteration: self.iteration,
            status: self.status,
            taken_at: chrono::Utc::now(),
            note: note.into(),
        });
        while self.snapshots.len() > limit {
            self.snapshots.pop_front();
        }
    }

    /// Append or overwrite-with-warning a history record by call-id.
    /// Returns `true` if an existing record was overwritten.
    pub fn record_history(&mut self, record: ToolExecutionRecord) -> bool {
        if let Some(existing) = self.history.iter_mut().find(|r| r.call_id == record.call_id) {
            *existing = record;
            true
        } else {
            self.history.push(record);
            false
        }
    }

    /// Purge stale synthetic error records: visible for exactly one
    /// iteration after the one that created them.
    pub fn purge_stale_synthetic_records(&mut self, current_iteration: u64) {
        self.history.retain(|r| {
            if !r.is_synthetic_error() {
                return true;
            }
            match r.synthetic_iteration() {
                Some(n) => current_iteration.saturating_sub(n) < 2,
                None => true,
            }
        });
    }

    pub fn pending_by_call_id(&self, call_id: &str) -> Option<&ToolCallProposal> {
        self.pending.iter().find(|p| p.call_id == call_id)
    }

    pub fn remove_pending(&mut self, call_ids: &[String]) {
        self.pending.retain(|p| !call_ids.contains(&p.call_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_record(call_id: &str) -> ToolExecutionRecord {
        ToolExecutionRecord {
            call_id: call_id.into(),
            tool_name: "system.format_validation".into(),
            params: vec![],
            accepted: true,
            executed_at: chrono::Utc::now(),
            summary: String::new(),
            result: serde_json::Value::Null,
            ops: vec![],
            error: Some("bad format".into()),
        }
    }

    #[test]
    fn snapshot_bound_enforced() {
        let mut t = TaskState::new("t1", "c1", "coder", "a1", "do x", None);
        for i in 0..30 {
            t.iteration = i;
            t.push_snapshot(format!("step {i}"), 20);
        }
        assert_eq!(t.snapshots.len(), 20);
        assert_eq!(t.snapshots.front().unwrap().iteration, 10);
    }

    #[test]
    fn duplicate_call_id_overwrites() {
        let mut t = TaskState::new("t1", "c1", "coder", "a1", "do x", None);
        let r1 = synthetic_record("format_error_iter1_a");
        let mut r2 = synthetic_record("format_error_iter1_a");
        r2.summary = "updated".into();
        assert!(!t.record_history(r1));
        assert!(t.record_history(r2));
        assert_eq!(t.history.len(), 1);
        assert_eq!(t.history[0].summary, "updated");
    }

    #[test]
    fn purge_keeps_record_for_exactly_one_extra_iteration() {
        let mut t = TaskState::new("t1", "c1", "coder", "a1", "do x", None);
        t.record_history(synthetic_record("format_error_iter3_a"));

        t.purge_stale_synthetic_records(3);
        assert_eq!(t.history.len(), 1, "still visible in the creating iteration");

        t.purge_stale_synthetic_records(4);
        assert_eq!(t.history.len(), 1, "visible for one more iteration");

        t.purge_stale_synthetic_records(5);
        assert!(t.history.is_empty(), "purged after exactly one extra iteration");
    }
}
