//! Event envelope delivered to the UI through a task's event callback.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    State,
    ToolExecution,
    CoderStream,
    CoderFileOperation,
    CoderFileRevert,
    Retry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_kind: EventKind,
    pub task_id: String,
    pub domain_id: String,
    pub payload: serde_json::Value,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Event {
    pub fn new(
        event_kind: EventKind,
        task_id: impl Into<String>,
        domain_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_kind,
            task_id: task_id.into(),
            domain_id: domain_id.into(),
            payload,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Single opaque callback supplied at task creation.
/// Implementations must never let a callback panic propagate into the core
/// state machine; `EventSink` wraps the call in `catch_unwind` at the call
/// site in `agentkit-logging`.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}
