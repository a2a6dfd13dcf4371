//! Prompt construction: assembles the single text block sent to the model
//! for one iteration, from the task's accumulated state plus whatever the
//! caller supplies fresh each turn (chat history, attachments, budget).

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use agentkit_tools::ToolRegistry;
use agentkit_types::{ExecutionPlan, TaskState, ToolExecutionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    System,
    Tool,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct AttachedFile {
    pub path: String,
    pub content: String,
}

/// Caller-supplied resource ceiling, rendered as a single advisory line —
/// the driver itself does not enforce it, the model is just told about it.
#[derive(Debug, Clone, Default)]
pub struct TaskBudget {
    pub max_iterations: Option<u32>,
    pub max_tool_calls: Option<u32>,
}

impl TaskBudget {
    fn render(&self, current_iteration: u64, tool_calls_used: usize) -> Option<String> {
        if self.max_iterations.is_none() && self.max_tool_calls.is_none() {
            return None;
        }
        let mut parts = vec![format!("iteration {current_iteration}")];
        if let Some(max) = self.max_iterations {
            parts.push(format!("of {max} max"));
        }
        if let Some(max) = self.max_tool_calls {
            parts.push(format!("{tool_calls_used}/{max} tool calls used"));
        }
        Some(format!("Budget: {}", parts.join(", ")))
    }
}

pub struct PromptInputs<'a> {
    pub task: &'a TaskState,
    pub registry: &'a ToolRegistry,
    pub chat_history: &'a [ChatMessage],
    pub attached_files: &'a [AttachedFile],
    pub budget: &'a TaskBudget,
    /// Set when re-entering after a rejected/invalid completion, so the
    /// model sees why it's being asked again.
    pub rejection_note: Option<&'a str>,
}

const BASE_INSTRUCTIONS: &str = "You are an autonomous coding agent. Respond using the tagged protocol \
described below. Call tools to inspect and modify the workspace; do not \
guess at file contents you have not read.";

/// Domain-specific instructions. The coder domain splits into a
/// planning-phase variant (no plan written yet) and an execution-phase
/// variant (plan exists).
fn domain_instructions(domain: &str, has_plan: bool) -> String {
    match domain {
        "coder" if !has_plan => "Before making changes, call plan.write with the steps you intend to \
            take. Keep steps small and independently verifiable."
            .to_string(),
        "coder" => "Work through the plan one step at a time, calling plan.update as each \
            step finishes. Re-read a file before editing it if you are unsure of its \
            current contents."
            .to_string(),
        other => format!("You are operating in the '{other}' domain."),
    }
}

fn render_tool_catalog(registry: &ToolRegistry) -> String {
    let mut tools = registry.list();
    tools.sort_by(|a, b| a.name().cmp(b.name()));

    let mut lines = vec!["Available tools:".to_string()];
    for tool in &tools {
        let spec = tool.spec();
        lines.push(format!("- {}: {}", spec.name, spec.description));
        for param in spec.required_params().chain(spec.optional_params()) {
            let mut line = format!(
                "    {}{} ({:?}): {}",
                param.name,
                if param.required { "" } else { " [optional]" },
                param.param_type,
                param.description
            );
            if let Some(values) = &param.r#enum {
                line.push_str(&format!(" one of [{}]", values.join(", ")));
            }
            if let Some(default) = &param.default {
                line.push_str(&format!(" default={default}"));
            }
            lines.push(line);
        }
    }
    lines.join("\n")
}

fn render_chat_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut lines = vec!["Conversation so far:".to_string()];
    for message in history {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
            ChatRole::Tool => "tool",
        };
        lines.push(format!("[{role}] {}", message.content));
    }
    lines.join("\n")
}

fn render_attached_files(files: &[AttachedFile]) -> String {
    if files.is_empty() {
        return String::new();
    }
    let mut lines = vec!["Attached files:".to_string()];
    for file in files {
        lines.push(format!("--- {} ---\n{}", file.path, file.content));
    }
    lines.join("\n")
}

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

/// Render the tool-execution history, deduplicating repeated `file.read`
/// output by content hash — a file re-read with unchanged content is shown
/// once instead of bloating the prompt with the same bytes every iteration.
fn render_tool_history(history: &[ToolExecutionRecord]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut seen_read_hashes: HashSet<String> = HashSet::new();
    let mut lines = vec!["Tool call history:".to_string()];
    for record in history {
        let outcome = match &record.error {
            Some(err) => format!("error: {err}"),
            None => record.summary.clone(),
        };
        if record.tool_name == "file.read" {
            if let Some(content) = record.result.get("content").and_then(|v| v.as_str()) {
                let hash = content_hash(content);
                if !seen_read_hashes.insert(hash) {
                    lines.push(format!("- [{}] {} (duplicate content already shown above)", record.call_id, record.tool_name));
                    continue;
                }
            }
        }
        lines.push(format!("- [{}] {} -> {}", record.call_id, record.tool_name, outcome));
    }
    lines.join("\n")
}

fn render_pending_notes(rejection_note: Option<&str>) -> String {
    match rejection_note {
        Some(note) => format!("Note: {note}"),
        None => String::new(),
    }
}

fn render_plan_status(plan: &Option<ExecutionPlan>) -> String {
    match plan {
        Some(plan) => plan.render_compact(),
        None => String::new(),
    }
}

const RESPONSE_FORMAT_STANZA: &str = "Respond using exactly this shape:\n\
<MESSAGE>free text for the user, may be empty</MESSAGE>\n\
<TOOL_CALL>\n  <TOOL>tool.name</TOOL>\n  <REASON>why this call</REASON>\n  <PARAM name=\"x\">value</PARAM>\n</TOOL_CALL>\n\
<AGENT_STATUS>AWAIT_TOOL|COMPLETE</AGENT_STATUS>\n\
Zero or more <TOOL_CALL> blocks are allowed; they never nest. Do not escape or wrap string parameter values.";

/// Collapse runs of 3+ newlines down to exactly 2 (one blank line between
/// sections).
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newline_run = 0;
    for ch in text.chars() {
        if ch == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push(ch);
            }
        } else {
            newline_run = 0;
            out.push(ch);
        }
    }
    out
}

pub fn build_prompt(inputs: &PromptInputs) -> String {
    let task = inputs.task;
    let sections = [
        BASE_INSTRUCTIONS.to_string(),
        domain_instructions(&task.domain_id, task.plan.is_some()),
        render_tool_catalog(inputs.registry),
        inputs
            .budget
            .render(task.iteration, task.history.iter().filter(|r| r.error.is_none()).count())
            .unwrap_or_default(),
        format!("Iteration: {}", task.iteration),
        format!("User request: {}", task.user_request),
        render_chat_history(inputs.chat_history),
        render_attached_files(inputs.attached_files),
        render_tool_history(&task.history),
        render_pending_notes(inputs.rejection_note),
        render_plan_status(&task.plan),
        RESPONSE_FORMAT_STANZA.to_string(),
    ];

    let joined = sections.iter().filter(|s| !s.is_empty()).cloned().collect::<Vec<_>>().join("\n\n");
    collapse_blank_lines(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_tools::register_builtins;

    fn task() -> TaskState {
        TaskState::new("t1", "c1", "coder", "a1", "add a function", None)
    }

    #[test]
    fn empty_sections_do_not_leave_blank_gaps() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        let t = task();
        let prompt = build_prompt(&PromptInputs {
            task: &t,
            registry: &registry,
            chat_history: &[],
            attached_files: &[],
            budget: &TaskBudget::default(),
            rejection_note: None,
        });
        assert!(!prompt.contains("\n\n\n"));
        assert!(prompt.contains("Iteration: 0"));
        assert!(prompt.contains("User request: add a function"));
    }

    #[test]
    fn planning_instructions_appear_before_a_plan_exists() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        let t = task();
        let prompt = build_prompt(&PromptInputs {
            task: &t,
            registry: &registry,
            chat_history: &[],
            attached_files: &[],
            budget: &TaskBudget::default(),
            rejection_note: None,
        });
        assert!(prompt.contains("call plan.write"));
    }

    #[test]
    fn execution_instructions_appear_once_a_plan_exists() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        let mut t = task();
        t.plan = Some(ExecutionPlan::new("add a function", vec![]));
        let prompt = build_prompt(&PromptInputs {
            task: &t,
            registry: &registry,
            chat_history: &[],
            attached_files: &[],
            budget: &TaskBudget::default(),
            rejection_note: None,
        });
        assert!(prompt.contains("calling plan.update"));
        assert!(!prompt.contains("call plan.write"));
    }

    #[test]
    fn duplicate_file_read_content_is_collapsed() {
        let mut t = task();
        let read = |call_id: &str| ToolExecutionRecord {
            call_id: call_id.into(),
            tool_name: "file.read".into(),
            params: vec![],
            accepted: true,
            executed_at: chrono::Utc::now(),
            summary: "read a.txt".into(),
            result: serde_json::json!({ "content": "same bytes" }),
            ops: vec![],
            error: None,
        };
        t.record_history(read("c1"));
        t.record_history(read("c2"));

        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        let prompt = build_prompt(&PromptInputs {
            task: &t,
            registry: &registry,
            chat_history: &[],
            attached_files: &[],
            budget: &TaskBudget::default(),
            rejection_note: None,
        });
        assert!(prompt.contains("duplicate content already shown above"));
    }

    #[test]
    fn budget_line_only_renders_when_supplied() {
        let t = task();
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        let without = build_prompt(&PromptInputs {
            task: &t,
            registry: &registry,
            chat_history: &[],
            attached_files: &[],
            budget: &TaskBudget::default(),
            rejection_note: None,
        });
        assert!(!without.contains("Budget:"));

        let with = build_prompt(&PromptInputs {
            task: &t,
            registry: &registry,
            chat_history: &[],
            attached_files: &[],
            budget: &TaskBudget { max_iterations: Some(20), max_tool_calls: None },
            rejection_note: None,
        });
        assert!(with.contains("Budget: iteration 0, of 20 max"));
    }
}
