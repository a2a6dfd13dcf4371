//! Tool Execution Record.

use serde::{Deserialize, Serialize};

use crate::paramvalue::ParamMap;

/// One op performed by a tool invocation (e.g. a single file write inside a
/// batched edit). Large fields are trimmed before storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOp {
    pub op_type: String,
    pub path: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before_checkpoint_id: Option<String>,
    #[serde(default)]
    pub after_checkpoint_id: Option<String>,
    #[serde(default)]
    pub before_checkpoint_created: bool,
    #[serde(default)]
    pub after_checkpoint_created: bool,
    pub pre_executed: bool,
}

const TRIMMED_FIELDS_NOTE: &str = "trimmed: before, after, diff, patch, content, raw, original_content";

impl ToolOp {
    /// Drop large content fields before the op is stored in task history.
    pub fn trimmed_for_history(mut self) -> Self {
        self.before = None;
        self.after = None;
        self
    }
}

/// Append-only history entry. Call-ids are unique within a task's history;
/// on conflict the newer record replaces the older with a warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionRecord {
    pub call_id: String,
    pub tool_name: String,
    pub params: ParamMap,
    pub accepted: bool,
    pub executed_at: chrono::DateTime<chrono::Utc>,
    pub summary: String,
    pub result: serde_json::Value,
    #[serde(default)]
    pub ops: Vec<ToolOp>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ToolExecutionRecord {
    /// True for the synthetic `system.*` records the driver inserts for
    /// format/parse/completion-rejection errors: their call-id carries a
    /// stable error-kind prefix so they can be garbage-collected after
    /// exactly one iteration of visibility.
    pub fn is_synthetic_error(&self) -> bool {
        self.call_id.starts_with("format_error_iter")
            || self.call_id.starts_with("parse_error_iter")
            || self.call_id.starts_with("completion_rejected_iter")
    }

    /// Extract the iteration number embedded in a synthetic call-id, e.g.
    /// `format_error_iter3_x92f` -> `3`.
    pub fn synthetic_iteration(&self) -> Option<u64> {
        let rest = self
            .call_id
            .split("_iter")
            .nth(1)?;
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(call_id: &str) -> ToolExecutionRecord {
        ToolExecutionRecord {
            call_id: call_id.into(),
            tool_name: "system.format_validation".into(),
            params: vec![],
            accepted: true,
            executed_at: chrono::Utc::now(),
            summary: String::new(),
            result: serde_json::Value::Null,
            ops: vec![],
            error: None,
        }
    }

    #[test]
    fn detects_synthetic_records() {
        assert!(record("format_error_iter3_ab12").is_synthetic_error());
        assert!(record("parse_error_iter1_xx").is_synthetic_error());
        assert!(!record("c_abc123").is_synthetic_error());
    }

    #[test]
    fn extracts_iteration_number() {
        assert_eq!(record("format_error_iter3_ab12").synthetic_iteration(), Some(3));
        assert_eq!(record("parse_error_iter12_zz").synthetic_iteration(), Some(12));
        assert_eq!(record("c_abc").synthetic_iteration(), None);
    }

    #[test]
    fn trim_clears_large_fields() {
        let op = ToolOp {
            op_type: "file_write".into(),
            path: Some("a.txt".into()),
            before: Some("old".into()),
            after: Some("new".into()),
            before_checkpoint_id: None,
            after_checkpoint_id: None,
            before_checkpoint_created: false,
            after_checkpoint_created: false,
            pre_executed: false,
        }
        .trimmed_for_history();
        assert!(op.before.is_none());
        assert!(op.after.is_none());
        let _ = TRIMMED_FIELDS_NOTE;
    }
}
