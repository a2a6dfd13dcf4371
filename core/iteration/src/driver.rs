//! The agent state machine. `IterationDriver::drive` is the single entry
//! point for running a task forward; it loops in place for corrective
//! iterations instead of recursing.

use std::path::PathBuf;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex as AsyncMutex;

use agentkit_approval::{handle_tool_decisions as approval_decide, Decision, DecisionOutcome};
use agentkit_autoexec::AutoExecEngine;
use agentkit_checkpoint::CheckpointStore;
use agentkit_config::EngineConfig;
use agentkit_error::CoreError;
use agentkit_parser::AgentStatus;
use agentkit_registry::{ActiveTaskRegistry, TaskHandle};
use agentkit_retry::{is_retryable, BackoffController};
use agentkit_streaming::{StreamCoupler, StreamEvent};
use agentkit_tools::{ToolContext, ToolRegistry};
use agentkit_types::{Event, EventKind, EventSink, TaskState, TaskStatus, ToolCallProposal, ToolExecutionRecord};

use crate::model_client::{ModelChunk, ModelClient};
use crate::prompt::{self, AttachedFile, ChatMessage, PromptInputs, TaskBudget};
use crate::validate::{validate_completion, COMPLETION_REJECTED_FEEDBACK};

/// Final (or momentarily-final) disposition of one `drive` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    WaitingUser,
    Completed,
    Failed,
    Aborted,
}

/// Parameters for starting a brand new task.
pub struct NewTask<'a> {
    pub domain: &'a str,
    pub chat_id: &'a str,
    pub agent_id: &'a str,
    pub request: &'a str,
    pub chat_history: Vec<ChatMessage>,
    pub attached_files: Vec<AttachedFile>,
    pub budget: TaskBudget,
    pub workspace_path: Option<PathBuf>,
}

pub struct IterationDriver<M> {
    config: EngineConfig,
    registry: Arc<ToolRegistry>,
    tasks: Arc<ActiveTaskRegistry>,
    checkpoints: Arc<AsyncMutex<CheckpointStore>>,
    autoexec: AutoExecEngine,
    model: M,
    event_sink: Arc<dyn EventSink>,
}

impl<M: ModelClient> IterationDriver<M> {
    pub fn new(
        config: EngineConfig,
        registry: Arc<ToolRegistry>,
        tasks: Arc<ActiveTaskRegistry>,
        model: M,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        let checkpoints = Arc::new(AsyncMutex::new(CheckpointStore::new(&config)));
        let autoexec = AutoExecEngine::new(config.clone());
        Self {
            config,
            registry,
            tasks,
            checkpoints,
            autoexec,
            model,
            event_sink,
        }
    }

    pub async fn execute_domain_task(&self, new_task: NewTask<'_>) -> Result<Arc<TaskHandle>, CoreError> {
        let task_id = format!("task_{:016x}", rand::rng().random::<u64>());
        let workspace = new_task.workspace_path.as_ref().map(|p| p.to_string_lossy().to_string());
        let mut state = TaskState::new(task_id, new_task.chat_id, new_task.domain, new_task.agent_id, new_task.request, workspace);
        state.push_snapshot("task created", self.config.context_snapshot_limit);
        agentkit_logging::log_task_started(&state);

        let handle = self.tasks.insert(state);
        self.drive(&handle, &new_task.chat_history, &new_task.attached_files, &new_task.budget).await?;
        Ok(handle)
    }

    /// Decide a batch of pending tool calls, then progress the task: stay
    /// `waiting_user` if more remain, finalize a deferred completion, or
    /// re-enter the iteration loop.
    pub async fn handle_decisions(
        &self,
        task_id: &str,
        decisions: Vec<(String, Decision)>,
    ) -> Result<Vec<DecisionOutcome>, CoreError> {
        let handle = match self.tasks.get(task_id) {
            Some(handle) => handle,
            None if self.tasks.stale_decision_status(task_id).is_some() => {
                return Ok(decisions
                    .into_iter()
                    .map(|(call_id, _)| DecisionOutcome { call_id, record: None, plan_update: None, stale: true })
                    .collect());
            }
            None => return Err(CoreError::ToolExecution { message: format!("no such task '{task_id}'") }),
        };

        let mut guard = handle.state.lock().await;
        if guard.pending.is_empty() {
            return Ok(decisions
                .into_iter()
                .map(|(call_id, _)| DecisionOutcome { call_id, record: None, plan_update: None, stale: true })
                .collect());
        }

        let ctx = ToolContext::new(guard.workspace_path.as_ref().map(PathBuf::from)).with_plan(guard.plan.clone());
        let outcomes = {
            let mut checkpoints = self.checkpoints.lock().await;
            approval_decide(&mut guard, &decisions, &self.registry, &ctx, &mut checkpoints).await?
        };

        let any_rejected = decisions
            .iter()
            .any(|(call_id, decision)| *decision == Decision::Reject && outcomes.iter().any(|o| &o.call_id == call_id && !o.stale));
        if any_rejected {
            guard.status = TaskStatus::Aborted;
            guard.push_snapshot("rejected tool call: task aborted", self.config.context_snapshot_limit);
            self.emit_state(&guard);
            agentkit_logging::log_task_terminal(&guard);
            self.tasks.retire(task_id, TaskStatus::Aborted);
            return Ok(outcomes);
        }

        for outcome in &outcomes {
            if let Some(plan) = &outcome.plan_update {
                guard.plan = Some(plan.clone());
            }
        }

        if !guard.pending.is_empty() {
            guard.status = TaskStatus::WaitingUser;
            self.emit_state(&guard);
            return Ok(outcomes);
        }

        if let Some(message) = guard.deferred_completion_message.take() {
            guard.status = TaskStatus::Completed;
            guard.agent_message = Some(message);
            guard.push_snapshot("deferred completion finalized", self.config.context_snapshot_limit);
            self.emit_state(&guard);
            agentkit_logging::log_task_terminal(&guard);
            self.tasks.retire(task_id, TaskStatus::Completed);
            return Ok(outcomes);
        }

        drop(guard);
        self.drive(&handle, &[], &[], &TaskBudget::default()).await?;
        Ok(outcomes)
    }

    /// External cancel hook. Does not interrupt an in-flight model call; a
    /// terminal task is a no-op.
    pub async fn abort_task(&self, task_id: &str, reason: &str) -> Result<(), CoreError> {
        let Some(handle) = self.tasks.get(task_id) else {
            return Ok(());
        };
        handle.cancellation.cancel();
        let mut task = handle.state.lock().await;
        if task.status.is_terminal() {
            return Ok(());
        }
        task.status = TaskStatus::Aborted;
        task.agent_message = Some(format!("aborted: {reason}"));
        task.push_snapshot(format!("aborted: {reason}"), self.config.context_snapshot_limit);
        self.emit_state(&task);
        agentkit_logging::log_task_terminal(&task);
        drop(task);
        self.tasks.retire(task_id, TaskStatus::Aborted);
        Ok(())
    }

    /// Resume a task parked in `await_continuation` (a rare tool-flow path).
    pub async fn continue_task(&self, task_id: &str) -> Result<(), CoreError> {
        let handle = self.tasks.require(task_id)?;
        {
            let task = handle.state.lock().await;
            if task.status != TaskStatus::AwaitContinuation {
                return Ok(());
            }
        }
        self.drive(&handle, &[], &[], &TaskBudget::default()).await
    }

    /// The `run_iteration` loop body, looping in place for corrective
    /// iterations rather than recursing.
    async fn drive(
        &self,
        handle: &Arc<TaskHandle>,
        chat_history: &[ChatMessage],
        attached_files: &[AttachedFile],
        budget: &TaskBudget,
    ) -> Result<DriveOutcome, CoreError> {
        loop {
            let mut guard = handle.state.lock().await;
            if guard.status.is_terminal() {
                return Ok(terminal_outcome(guard.status));
            }

            guard.iteration += 1;
            guard.purge_stale_synthetic_records(guard.iteration);
            agentkit_logging::log_iteration_started(&guard);

            let prompt_text = prompt::build_prompt(&PromptInputs {
                task: &guard,
                registry: &self.registry,
                chat_history,
                attached_files,
                budget,
                rejection_note: None,
            });

            let is_coder = guard.domain_id == "coder";
            let task_id = guard.task_id.clone();
            let domain_id = guard.domain_id.clone();
            let iteration = guard.iteration;

            // The model call is the long suspension point; the task's data
            // is not otherwise touched while it is in flight.
            drop(guard);
            let call_result = self.call_model_with_retry(&prompt_text, is_coder, &task_id, &domain_id, iteration).await;
            let mut guard = handle.state.lock().await;

            let full_text = match call_result {
                Ok(text) => text,
                Err(e) => {
                    guard.status = TaskStatus::Failed;
                    guard.agent_message = Some(format!("model call failed: {e}"));
                    guard.push_snapshot("model call failed", self.config.context_snapshot_limit);
                    self.emit_state(&guard);
                    agentkit_logging::log_task_terminal(&guard);
                    self.tasks.retire(&task_id, TaskStatus::Failed);
                    return Ok(DriveOutcome::Failed);
                }
            };

            let parsed = agentkit_parser::parse(&full_text, Some(&*self.registry));
            guard.last_full_response = Some(full_text);

            if parsed.is_parse_error() {
                push_corrective(&mut guard, "format_error", "system.format_validation", "response had no recognizable status or tool call");
                guard.push_snapshot("corrective: format error", self.config.context_snapshot_limit);
                self.emit_state(&guard);
                continue;
            }
            if parsed.is_malformed_tool_call() {
                push_corrective(&mut guard, "parse_error", "system.parse_validation", "AWAIT_TOOL declared with no extractable tool call");
                guard.push_snapshot("corrective: parse error", self.config.context_snapshot_limit);
                self.emit_state(&guard);
                continue;
            }

            let is_complete = match &parsed.status {
                Some(AgentStatus::Complete) => true,
                Some(AgentStatus::Other(kind)) => {
                    tracing::warn!(task_id = %task_id, status = %kind, "unrecognized agent status, treating as COMPLETE");
                    true
                }
                _ => false,
            };

            if parsed.tool_calls.is_empty() {
                debug_assert!(is_complete, "await_tool with no tool calls is already handled as malformed above");
                match validate_completion(&guard) {
                    Ok(()) => {
                        guard.status = TaskStatus::Completed;
                        guard.agent_message = Some(parsed.message.clone());
                        guard.push_snapshot("completed", self.config.context_snapshot_limit);
                        self.emit_state(&guard);
                        agentkit_logging::log_agent_message(&task_id, &parsed.message);
                        agentkit_logging::log_task_terminal(&guard);
                        self.tasks.retire(&task_id, TaskStatus::Completed);
                        return Ok(DriveOutcome::Completed);
                    }
                    Err(_) => {
                        guard.history.retain(|r| !r.call_id.starts_with("completion_rejected_iter"));
                        push_corrective(&mut guard, "completion_rejected", "system.completion_validation", COMPLETION_REJECTED_FEEDBACK);
                        guard.push_snapshot("corrective: completion rejected", self.config.context_snapshot_limit);
                        self.emit_state(&guard);
                        continue;
                    }
                }
            }

            // AWAIT_TOOL or COMPLETE, both with >=1 tool calls: validate
            // every proposed tool before registering any of them. An
            // unknown or disallowed tool is fatal for the whole task.
            for call in &parsed.tool_calls {
                if let Err(e) = self.registry.check_allowed(&domain_id, &call.tool_name) {
                    guard.status = TaskStatus::Failed;
                    guard.agent_message = Some(format!("task failed: {e}"));
                    guard.push_snapshot("failed: disallowed tool", self.config.context_snapshot_limit);
                    self.emit_state(&guard);
                    agentkit_logging::log_task_terminal(&guard);
                    self.tasks.retire(&task_id, TaskStatus::Failed);
                    return Ok(DriveOutcome::Failed);
                }
            }

            let workspace_path = guard.workspace_path.as_ref().map(PathBuf::from);
            let plan = guard.plan.clone();
            for (index, call) in parsed.tool_calls.iter().enumerate() {
                let call_id = agentkit_streaming::synthesize_call_id(iteration, index as u64);
                let proposal = if self.autoexec.is_eligible(&call.tool_name) {
                    let ctx = ToolContext::new(workspace_path.clone()).with_plan(plan.clone());
                    match self.registry.get(&call.tool_name) {
                        Ok(tool) => {
                            match self
                                .autoexec
                                .speculate(&*tool, &call_id, &call.reason, call.params.clone(), &ctx)
                                .await
                            {
                                Ok(exec) => {
                                    self.emit_file_operation(&task_id, &domain_id, &call_id, &exec);
                                    exec.proposal
                                }
                                Err(e) => {
                                    tracing::warn!(task_id = %task_id, tool = %call.tool_name, error = %e, "auto-execute speculation failed, falling back to ordinary approval");
                                    ToolCallProposal::new(call_id, call.tool_name.clone(), call.params.clone(), call.reason.clone())
                                }
                            }
                        }
                        Err(_) => ToolCallProposal::new(call_id, call.tool_name.clone(), call.params.clone(), call.reason.clone()),
                    }
                } else {
                    ToolCallProposal::new(call_id, call.tool_name.clone(), call.params.clone(), call.reason.clone())
                };
                guard.pending.push(proposal);
            }

            if is_complete {
                guard.deferred_completion_message = Some(parsed.message.clone());
            }
            guard.status = TaskStatus::WaitingUser;
            guard.push_snapshot("awaiting tool decisions", self.config.context_snapshot_limit);
            self.emit_state(&guard);
            return Ok(DriveOutcome::WaitingUser);
        }
    }

    async fn call_model_with_retry(
        &self,
        prompt: &str,
        is_coder: bool,
        task_id: &str,
        domain_id: &str,
        iteration: u64,
    ) -> Result<String, CoreError> {
        let backoff = BackoffController::new(&self.config);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let mut coupler = StreamCoupler::new(iteration);
            let mut on_chunk = |chunk: ModelChunk| match chunk {
                ModelChunk::Reasoning(text) => agentkit_logging::log_reasoning_chunk(task_id, &text),
                ModelChunk::Answer(delta) => {
                    if is_coder {
                        for event in coupler.push(&delta, Some(&*self.registry)) {
                            self.event_sink.emit(Event::new(EventKind::CoderStream, task_id, domain_id, stream_event_payload(&event)));
                        }
                    }
                }
            };

            match self.model.call(prompt, &mut on_chunk).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    let message = e.to_string();
                    if is_retryable(&message) && backoff.should_retry(attempt) {
                        let delay = backoff.delay_for_attempt(attempt);
                        agentkit_logging::log_retry(task_id, attempt, backoff.max_attempts(), &message);
                        self.event_sink.emit(Event::new(
                            EventKind::Retry,
                            task_id,
                            domain_id,
                            serde_json::json!({
                                "attempt": attempt,
                                "max": backoff.max_attempts(),
                                "delay_ms": delay.as_millis(),
                                "error": message,
                            }),
                        ));
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(e);
                }
            }
        }
    }

    fn emit_state(&self, task: &TaskState) {
        self.event_sink.emit(Event::new(
            EventKind::State,
            &task.task_id,
            &task.domain_id,
            serde_json::json!({
                "status": task.status,
                "iteration": task.iteration,
                "pending": task.pending.len(),
            }),
        ));
    }

    fn emit_file_operation(&self, task_id: &str, domain_id: &str, call_id: &str, exec: &agentkit_autoexec::SpeculativeExecution) {
        let full_line_count = exec.diff.lines_added + exec.diff.lines_removed + exec.diff.lines_unchanged;
        let send_delta = agentkit_autoexec::should_send_delta(&exec.diff, full_line_count, 0.3);
        self.event_sink.emit(Event::new(
            EventKind::CoderFileOperation,
            task_id,
            domain_id,
            serde_json::json!({
                "call_id": call_id,
                "tool_name": exec.proposal.tool_name,
                "lines_added": exec.diff.lines_added,
                "lines_removed": exec.diff.lines_removed,
                "send_delta": send_delta,
            }),
        ));
    }
}

fn terminal_outcome(status: TaskStatus) -> DriveOutcome {
    match status {
        TaskStatus::Completed => DriveOutcome::Completed,
        TaskStatus::Failed => DriveOutcome::Failed,
        TaskStatus::Aborted => DriveOutcome::Aborted,
        _ => DriveOutcome::WaitingUser,
    }
}

fn random_suffix() -> String {
    format!("{:06x}", rand::rng().random::<u32>() & 0x00ff_ffff)
}

fn push_corrective(task: &mut TaskState, error_kind: &str, tool_name: &str, message: &str) {
    let call_id = format!("{error_kind}_iter{}_{}", task.iteration, random_suffix());
    task.record_history(ToolExecutionRecord {
        call_id,
        tool_name: tool_name.to_string(),
        params: Vec::new(),
        accepted: true,
        executed_at: chrono::Utc::now(),
        summary: message.to_string(),
        result: serde_json::Value::Null,
        ops: Vec::new(),
        error: Some(message.to_string()),
    });
}

fn stream_event_payload(event: &StreamEvent) -> serde_json::Value {
    serde_json::json!({
        "segment": format!("{:?}", event.segment),
        "action": format!("{:?}", event.action),
        "payload": event.payload,
    })
}
