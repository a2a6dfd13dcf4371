//! Tool Registry and built-in tool catalog.

mod builtin;
mod context;
mod edit_ops;
mod exec_jobs;
mod registry;
mod tool;

pub use builtin::{
    register_builtins, FileAttachTool, FileEditTool, FileGrepTool, FileListDirTool, FileMoveLinesTool, FileMoveTool,
    FileNotebookEditTool, FileReadTool, FileSearchTool, FileWriteTool, LlmGenerateTool, MediaImageGenerateTool,
    PlanUpdateTool, PlanWriteTool, RagIndexTool, RagSearchTool, SystemExecKillTool, SystemExecListTool,
    SystemExecStatusTool, SystemExecTool, SystemExecWaitTool, WebSearchTool,
};
pub use context::ToolContext;
pub use edit_ops::{apply_find_replace, apply_line_range, invert_find_replace, reconstruct_line_range};
pub use exec_jobs::{ExecJobInfo, ExecJobStatus, ExecJobs, StubExecJobs};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolOutput};
