//! The [`Tool`] trait every registered tool implements.

use async_trait::async_trait;

use agentkit_error::CoreError;
use agentkit_types::{ParamMap, ToolOp, ToolSpec};

use crate::context::ToolContext;

/// The result of one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub summary: String,
    pub result: serde_json::Value,
    pub ops: Vec<ToolOp>,
}

impl ToolOutput {
    pub fn text(summary: impl Into<String>) -> Self {
        let summary = summary.into();
        Self {
            result: serde_json::Value::String(summary.clone()),
            summary,
            ops: Vec::new(),
        }
    }
}

/// A tool registered with the [`crate::registry::ToolRegistry`].
/// Implementors declare their schema once and are looked up by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> &ToolSpec;

    fn name(&self) -> &str {
        &self.spec().name
    }

    async fn execute(
        &self,
        params: &ParamMap,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, CoreError>;
}
