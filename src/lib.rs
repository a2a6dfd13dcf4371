//! Iterative agent execution engine: a tagged-XML model-response protocol,
//! a schema-driven tool registry, speculative auto-execution with revert,
//! and a checkpoint/approval pipeline, all tied together behind one
//! [`Executor`].

mod executor;

pub use executor::{Executor, ExecutorBuilder, SubmitRequest};

// Re-exported so an embedder can depend on this crate alone.
pub use agentkit_approval::{Decision, DecisionOutcome};
pub use agentkit_config::EngineConfig;
pub use agentkit_error::{CoreError, ErrorKind};
pub use agentkit_iteration::{AttachedFile, ChatMessage, ChatRole, DriveOutcome, ModelChunk, ModelClient, TaskBudget};
pub use agentkit_logging::{BroadcastEventSink, NullEventSink};
pub use agentkit_registry::{ActiveTaskRegistry, TaskHandle};
pub use agentkit_tools::{
    register_builtins, ExecJobInfo, ExecJobStatus, ExecJobs, StubExecJobs, Tool, ToolContext, ToolOutput, ToolRegistry,
};
pub use agentkit_types::{
    Event, EventKind, EventSink, ExecutionPlan, ParamMap, ParamValue, PlanStep, StepStatus, TaskState, TaskStatus,
    ToolCallProposal, ToolExecutionRecord, ToolSpec,
};
