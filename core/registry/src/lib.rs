//! The single in-memory map from task id to task state, plus the
//! recently-completed set that backs the stale-decision grace window.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use agentkit_config::EngineConfig;
use agentkit_error::CoreError;
use agentkit_types::{TaskState, TaskStatus};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

/// A live task: its mutable state behind an async mutex, and a token used
/// by `abort_task`. Only the iteration driver ever locks and mutates a
/// given task's state, which is what enforces single-writer-per-task; the
/// driver drops the guard around the model call (the long suspension
/// point) and re-acquires it after, rather than holding it continuously.
pub struct TaskHandle {
    pub state: Arc<AsyncMutex<TaskState>>,
    pub cancellation: CancellationToken,
}

impl TaskHandle {
    fn new(state: TaskState) -> Self {
        Self {
            state: Arc::new(AsyncMutex::new(state)),
            cancellation: CancellationToken::new(),
        }
    }
}

struct RecentlyCompletedEntry {
    final_status: TaskStatus,
    completed_at: Instant,
}

/// The registry itself. Held behind one `Arc` at the facade layer rather
/// than wrapping individual fields in their own `Arc`s.
pub struct ActiveTaskRegistry {
    grace: std::time::Duration,
    recently_completed_ttl: std::time::Duration,
    tasks: Mutex<HashMap<String, Arc<TaskHandle>>>,
    recently_completed: Mutex<HashMap<String, RecentlyCompletedEntry>>,
}

impl ActiveTaskRegistry {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            grace: config.stale_decision_grace,
            recently_completed_ttl: config.recently_completed_ttl,
            tasks: Mutex::new(HashMap::new()),
            recently_completed: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, state: TaskState) -> Arc<TaskHandle> {
        let task_id = state.task_id.clone();
        let handle = Arc::new(TaskHandle::new(state));
        self.tasks.lock().unwrap().insert(task_id, handle.clone());
        handle
    }

    pub fn get(&self, task_id: &str) -> Option<Arc<TaskHandle>> {
        self.tasks.lock().unwrap().get(task_id).cloned()
    }

    /// Move a task out of the active set once it reaches a terminal status,
    /// remembering it in the recently-completed set for `recently_completed_ttl`
    /// so a just-too-late decision gets a clean stale response rather than
    /// `UnknownTool`-style confusion.
    pub fn retire(&self, task_id: &str, final_status: TaskStatus) {
        self.tasks.lock().unwrap().remove(task_id);
        self.recently_completed.lock().unwrap().insert(
            task_id.to_string(),
            RecentlyCompletedEntry {
                final_status,
                completed_at: Instant::now(),
            },
        );
    }

    /// Look up whether a decision/continuation for `task_id` arrived inside
    /// the stale-decision grace window after the task went terminal.
    /// Distinct from `recently_completed_ttl`: a task can be long gone from
    /// `recently_completed` while still inside a shorter grace window, or
    /// vice versa — the two knobs are deliberately separate.
    pub fn stale_decision_status(&self, task_id: &str) -> Option<TaskStatus> {
        let entries = self.recently_completed.lock().unwrap();
        let entry = entries.get(task_id)?;
        if entry.completed_at.elapsed() <= self.grace {
            Some(entry.final_status)
        } else {
            None
        }
    }

    /// Whether `task_id` is known to have completed recently (used to
    /// distinguish "never existed" from "already finished" when a caller
    /// references a task outside the grace window).
    pub fn was_recently_completed(&self, task_id: &str) -> bool {
        self.recently_completed.lock().unwrap().contains_key(task_id)
    }

    /// Drop recently-completed entries older than `recently_completed_ttl`.
    /// The iteration driver invokes this periodically; it is not
    /// triggered automatically so tests stay deterministic.
    pub fn prune_expired(&self) {
        let ttl = self.recently_completed_ttl;
        self.recently_completed
            .lock()
            .unwrap()
            .retain(|_, entry| entry.completed_at.elapsed() <= ttl);
    }

    pub fn require(&self, task_id: &str) -> Result<Arc<TaskHandle>, CoreError> {
        self.get(task_id).ok_or_else(|| CoreError::ToolExecution {
            message: format!("no active task '{task_id}'"),
        })
    }
}
