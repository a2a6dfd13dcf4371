//! Session logging and event emission: structured `tracing` calls for task
//! lifecycle events, plus the `EventSink` wrappers that fan them out to UI
//! callbacks.

mod session;
mod sink;

pub use session::{
    log_agent_message, log_iteration_started, log_reasoning_chunk, log_retry, log_task_started, log_task_terminal, log_tool_call,
    log_tool_error,
};
pub use sink::{BroadcastEventSink, NullEventSink, SessionLogger};
