//! [`Executor`]: the single entry point an embedder constructs and holds
//! for the lifetime of a session. Wires the tool registry, the model
//! client, the active task registry, and the event sink into one
//! [`agentkit_iteration::IterationDriver`] and exposes its four operations
//! as a small, anyhow-friendly API.

use std::path::PathBuf;
use std::sync::Arc;

use agentkit_approval::{Decision, DecisionOutcome};
use agentkit_config::EngineConfig;
use agentkit_iteration::{AttachedFile, ChatMessage, IterationDriver, ModelClient, NewTask, TaskBudget};
use agentkit_logging::{NullEventSink, SessionLogger};
use agentkit_registry::{ActiveTaskRegistry, TaskHandle};
use agentkit_tools::{register_builtins, ToolRegistry};
use agentkit_types::{EventSink, TaskState};

/// One request to start a brand new task. `agent_id` is generated with
/// `uuid::Uuid::new_v4` when left unset, mirroring how a fresh
/// conversation thread gets its identity when the caller doesn't care to
/// name it themselves.
#[derive(Default)]
pub struct SubmitRequest {
    pub domain: String,
    pub chat_id: String,
    pub agent_id: Option<String>,
    pub request: String,
    pub chat_history: Vec<ChatMessage>,
    pub attached_files: Vec<AttachedFile>,
    pub budget: TaskBudget,
    pub workspace_path: Option<PathBuf>,
}

/// Builder for [`Executor`]. Only `model` is mandatory; everything else
/// falls back to a sensible default so a minimal embedder can get a
/// working engine with one call.
pub struct ExecutorBuilder<M> {
    model: Option<M>,
    tool_registry: Option<Arc<ToolRegistry>>,
    config: EngineConfig,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl<M: ModelClient> ExecutorBuilder<M> {
    pub fn new() -> Self {
        Self {
            model: None,
            tool_registry: None,
            config: EngineConfig::default(),
            event_sink: None,
        }
    }

    pub fn model(mut self, model: M) -> Self {
        self.model = Some(model);
        self
    }

    /// Supply a pre-populated registry (e.g. built-ins plus custom tools).
    /// Without this, [`register_builtins`] is used on a fresh registry.
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = Some(registry);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Supply the embedder's UI callback. Always wrapped in
    /// [`SessionLogger`] so a panicking callback can't take the state
    /// machine down with it; without this, events are only logged, never
    /// forwarded anywhere.
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn build(self) -> anyhow::Result<Executor<M>> {
        let model = self.model.ok_or_else(|| anyhow::anyhow!("Executor requires a model client"))?;
        let registry = self.tool_registry.unwrap_or_else(|| {
            let mut registry = ToolRegistry::new();
            register_builtins(&mut registry);
            Arc::new(registry)
        });
        let tasks = Arc::new(ActiveTaskRegistry::new(&self.config));
        let sink: Arc<dyn EventSink> = match self.event_sink {
            Some(inner) => Arc::new(SessionLogger::new(SinkHandle(inner))),
            None => Arc::new(SessionLogger::new(NullEventSink)),
        };
        let driver = IterationDriver::new(self.config, registry, tasks.clone(), model, sink);
        Ok(Executor { driver, tasks })
    }
}

impl<M: ModelClient> Default for ExecutorBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapts an `Arc<dyn EventSink>` into an owned [`EventSink`] impl so it
/// can be wrapped by [`SessionLogger`] without a double-`Arc`.
struct SinkHandle(Arc<dyn EventSink>);

impl EventSink for SinkHandle {
    fn emit(&self, event: agentkit_types::Event) {
        self.0.emit(event);
    }
}

/// The engine an embedder constructs once per process (or once per
/// conversation server, for a multi-tenant host) and shares behind an
/// `Arc` across every request.
pub struct Executor<M> {
    driver: IterationDriver<M>,
    tasks: Arc<ActiveTaskRegistry>,
}

impl<M: ModelClient> Executor<M> {
    pub fn builder() -> ExecutorBuilder<M> {
        ExecutorBuilder::new()
    }

    /// Start a new task and drive it to its first pause point (awaiting
    /// tool decisions, or already complete/failed).
    pub async fn submit_task(&self, mut req: SubmitRequest) -> anyhow::Result<Arc<TaskHandle>> {
        let agent_id = req.agent_id.take().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        tracing::info!(domain = %req.domain, chat_id = %req.chat_id, agent_id = %agent_id, "submitting task");
        let handle = self
            .driver
            .execute_domain_task(NewTask {
                domain: &req.domain,
                chat_id: &req.chat_id,
                agent_id: &agent_id,
                request: &req.request,
                chat_history: req.chat_history,
                attached_files: req.attached_files,
                budget: req.budget,
                workspace_path: req.workspace_path,
            })
            .await?;
        Ok(handle)
    }

    /// Decide a batch of pending tool calls for `task_id`.
    pub async fn decide(&self, task_id: &str, decisions: Vec<(String, Decision)>) -> anyhow::Result<Vec<DecisionOutcome>> {
        Ok(self.driver.handle_decisions(task_id, decisions).await?)
    }

    /// Cancel a task. A no-op if it is already terminal or unknown.
    pub async fn abort(&self, task_id: &str, reason: &str) -> anyhow::Result<()> {
        Ok(self.driver.abort_task(task_id, reason).await?)
    }

    /// Resume a task parked in `await_continuation`.
    pub async fn resume(&self, task_id: &str) -> anyhow::Result<()> {
        Ok(self.driver.continue_task(task_id).await?)
    }

    /// Snapshot of a task's current state, for an embedder that wants to
    /// render status without waiting on the next event.
    pub async fn task_state(&self, task_id: &str) -> Option<TaskState> {
        let handle = self.tasks.get(task_id)?;
        Some(handle.state.lock().await.clone())
    }

    /// Drop recently-completed task bookkeeping older than
    /// `EngineConfig::recently_completed_ttl`. An embedder calls this
    /// periodically; it is not triggered automatically so tests stay
    /// deterministic.
    pub fn prune_completed_tasks(&self) {
        self.tasks.prune_expired();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_error::CoreError;
    use async_trait::async_trait;

    struct EchoModel;

    #[async_trait]
    impl ModelClient for EchoModel {
        async fn call(&self, _prompt: &str, _on_chunk: &mut dyn FnMut(agentkit_iteration::ModelChunk)) -> Result<String, CoreError> {
            Ok("<AGENT_STATUS>COMPLETE</AGENT_STATUS>\n<MESSAGE>done</MESSAGE>".to_string())
        }
    }

    #[tokio::test]
    async fn builder_requires_a_model() {
        let err = ExecutorBuilder::<EchoModel>::new().build().unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[tokio::test]
    async fn submit_task_runs_to_completion_with_a_generated_agent_id() {
        let executor = Executor::builder().model(EchoModel).build().unwrap();
        let handle = executor
            .submit_task(SubmitRequest {
                domain: "chat".into(),
                chat_id: "chat1".into(),
                request: "say hi".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let state = handle.state.lock().await;
        assert_eq!(state.status, agentkit_types::TaskStatus::Completed);
        assert!(!state.agent_id.is_empty());
    }
}
