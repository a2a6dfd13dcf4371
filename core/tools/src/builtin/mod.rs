//! Concrete tool implementations registered with the built-in catalog.
//! File tools share `ctx.resolve` and `super::edit_ops` so sandboxing and
//! mutation semantics live in exactly one place.

mod file_edit;
mod file_grep;
mod file_list_dir;
mod file_move;
mod file_read;
mod file_search;
mod file_write;
mod plan_tools;
mod stubs;

pub use file_edit::FileEditTool;
pub use file_grep::FileGrepTool;
pub use file_list_dir::FileListDirTool;
pub use file_move::FileMoveTool;
pub use file_read::FileReadTool;
pub use file_search::FileSearchTool;
pub use file_write::FileWriteTool;
pub use plan_tools::{PlanUpdateTool, PlanWriteTool};
pub use stubs::{
    FileAttachTool, FileMoveLinesTool, FileNotebookEditTool, LlmGenerateTool,
    MediaImageGenerateTool, RagIndexTool, RagSearchTool, SystemExecKillTool, SystemExecListTool,
    SystemExecStatusTool, SystemExecTool, SystemExecWaitTool, WebSearchTool,
};

use std::sync::Arc;

use crate::registry::ToolRegistry;

/// Register every built-in tool under its canonical name.
pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register(Arc::new(FileReadTool::default()));
    registry.register(Arc::new(FileWriteTool::default()));
    registry.register(Arc::new(FileEditTool::default()));
    registry.register(Arc::new(FileListDirTool::default()));
    registry.register(Arc::new(FileSearchTool::default()));
    registry.register(Arc::new(FileGrepTool::default()));
    registry.register(Arc::new(FileMoveTool::default()));
    registry.register(Arc::new(PlanWriteTool::default()));
    registry.register(Arc::new(PlanUpdateTool::default()));
    registry.register(Arc::new(FileMoveLinesTool::default()));
    registry.register(Arc::new(FileNotebookEditTool::default()));
    registry.register(Arc::new(FileAttachTool::default()));
    registry.register(Arc::new(LlmGenerateTool::default()));
    registry.register(Arc::new(SystemExecTool::default()));
    registry.register(Arc::new(SystemExecStatusTool::default()));
    registry.register(Arc::new(SystemExecWaitTool::default()));
    registry.register(Arc::new(SystemExecKillTool::default()));
    registry.register(Arc::new(SystemExecListTool::default()));
    registry.register(Arc::new(RagIndexTool::default()));
    registry.register(Arc::new(RagSearchTool::default()));
    registry.register(Arc::new(WebSearchTool::default()));
    registry.register(Arc::new(MediaImageGenerateTool::default()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_builtins_register_without_collision() {
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        assert_eq!(registry.list().len(), 22);
    }
}
