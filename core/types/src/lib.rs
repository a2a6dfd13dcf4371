//! Shared data model for the iterative agent execution engine.

mod event;
mod execution;
mod paramvalue;
mod plan;
mod proposal;
mod task;
mod tool_spec;

pub use event::{Event, EventKind, EventSink};
pub use execution::{ToolExecutionRecord, ToolOp};
pub use paramvalue::{param_get, ParamMap, ParamValue};
pub use plan::{ExecutionPlan, PlanStep, StepStatus};
pub use proposal::{PreExecutionState, ToolCallProposal};
pub use task::{ContextSnapshot, TaskState, TaskStatus};
pub use tool_spec::{Effect, ParamSchema, ParamType, ToolSpec};

/// Narrow lookup capability the parser needs from the tool registry to
/// schema-coerce `<PARAM>` values, without the parser crate depending on
/// the full registry.
pub trait SchemaLookup: Send + Sync {
    fn param_schema(&self, tool_name: &str, param_name: &str) -> Option<ParamSchema>;
}

