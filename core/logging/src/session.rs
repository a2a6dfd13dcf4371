//! Structured lifecycle logging for a task's run.
//! These are plain `tracing` calls — the append-only session log is
//! whatever subscriber the embedder wires up (file, stdout, OTLP); this
//! crate only fixes the field names so every iteration/tool/session event
//! is queryable the same way.

use agentkit_types::TaskState;

pub fn log_task_started(task: &TaskState) {
    tracing::info!(
        task_id = %task.task_id,
        chat_id = %task.chat_id,
        domain_id = %task.domain_id,
        agent_id = %task.agent_id,
        "task started"
    );
}

pub fn log_iteration_started(task: &TaskState) {
    tracing::info!(
        task_id = %task.task_id,
        iteration = task.iteration,
        "iteration started"
    );
}

pub fn log_reasoning_chunk(task_id: &str, text: &str) {
    tracing::trace!(task_id = %task_id, chars = text.chars().count(), "reasoning chunk");
}

pub fn log_agent_message(task_id: &str, message: &str) {
    tracing::info!(task_id = %task_id, chars = message.chars().count(), "agent message");
}

pub fn log_tool_call(task_id: &str, call_id: &str, tool_name: &str, accepted: bool) {
    tracing::info!(
        task_id = %task_id,
        call_id = %call_id,
        tool = %tool_name,
        accepted,
        "tool call recorded"
    );
}

pub fn log_tool_error(task_id: &str, call_id: &str, tool_name: &str, error: &str) {
    tracing::warn!(
        task_id = %task_id,
        call_id = %call_id,
        tool = %tool_name,
        error = %error,
        "tool call failed"
    );
}

pub fn log_retry(task_id: &str, attempt: u32, max_attempts: u32, reason: &str) {
    tracing::warn!(
        task_id = %task_id,
        attempt,
        max_attempts,
        reason = %reason,
        "retrying provider call"
    );
}

pub fn log_task_terminal(task: &TaskState) {
    tracing::info!(
        task_id = %task.task_id,
        iteration = task.iteration,
        status = ?task.status,
        "task reached terminal status"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_types::TaskState;

    #[test]
    fn logging_calls_do_not_panic_without_a_subscriber() {
        let task = TaskState::new("t1", "c1", "coder", "agent1", "do it", None);
        log_task_started(&task);
        log_iteration_started(&task);
        log_reasoning_chunk("t1", "thinking...");
        log_agent_message("t1", "here you go");
        log_tool_call("t1", "call1", "file.write", true);
        log_tool_error("t1", "call1", "file.write", "disk full");
        log_retry("t1", 1, 5, "503 overloaded");
        log_task_terminal(&task);
    }
}
