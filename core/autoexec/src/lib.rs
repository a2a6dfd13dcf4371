//! Auto-Execute Engine: speculatively runs an eligible tool call
//! (`file.write`/`file.edit` by default) as soon as the streaming parser
//! has its full parameter set, rather than waiting for the model to finish
//! its turn and the user to approve. Capturing the pre-mutation state here
//! is what lets the revert engine undo it later if the user rejects it.

use agentkit_checkpoint::{diff_stats, DiffStats};
use agentkit_config::EngineConfig;
use agentkit_error::CoreError;
use agentkit_tools::{Tool, ToolContext, ToolOutput};
use agentkit_types::{param_get, ParamMap, PreExecutionState, ToolCallProposal};

/// Outcome of one speculative execution: the proposal (carrying the
/// `PreExecutionState` the revert engine needs), the tool's own output,
/// and diff statistics for the streaming UI payload.
pub struct SpeculativeExecution {
    pub proposal: ToolCallProposal,
    pub output: ToolOutput,
    pub diff: DiffStats,
}

pub struct AutoExecEngine {
    config: EngineConfig,
}

impl AutoExecEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn is_eligible(&self, tool_name: &str) -> bool {
        self.config.is_auto_execute_eligible(tool_name)
    }

    /// Run `tool` against `params` immediately, capturing whatever the
    /// target file looked like beforehand. `tool` must be one that writes
    /// to a single `file_path` parameter (the only auto-execute-eligible
    /// shape); callers should check [`Self::is_eligible`] first.
    pub async fn speculate(
        &self,
        tool: &dyn Tool,
        call_id: &str,
        reason: &str,
        params: ParamMap,
        ctx: &ToolContext,
    ) -> Result<SpeculativeExecution, CoreError> {
        let file_path = param_get(&params, "file_path")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| CoreError::TypeError {
                param: "file_path".into(),
                expected: "string".into(),
                message: "auto-execute requires a file_path parameter".into(),
            })?;

        let original_content = read_if_exists(ctx, &file_path).await?;

        let output = tool.execute(&params, ctx).await?;

        let created_dirs = output
            .result
            .get("created_dirs")
            .and_then(|v| v.as_array())
            .map(|entries| entries.iter().filter_map(|e| e.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let pre_state = PreExecutionState {
            tool_name: tool.name().to_string(),
            file_path: file_path.clone(),
            original_content: original_content.clone(),
            resolved_params: params.clone(),
            created_dirs,
        };
        let proposal = ToolCallProposal::new(call_id, tool.name(), params, reason).with_pre_execution(pre_state);

        let after_content = read_if_exists(ctx, &file_path).await?.unwrap_or_default();
        let diff = diff_stats(original_content.as_deref().unwrap_or(""), &after_content);

        Ok(SpeculativeExecution { proposal, output, diff })
    }
}

async fn read_if_exists(ctx: &ToolContext, relative: &str) -> Result<Option<String>, CoreError> {
    let (abs_path, rel) = ctx.resolve(relative)?;
    match tokio::fs::read_to_string(&abs_path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CoreError::Io { path: rel, source }),
    }
}

/// Whether the streaming UI should be sent just the diff (`true`) or the
/// full new content (`false`), based on how much of the file actually
/// changed. `threshold_fraction` is a caller-supplied knob, not a baked-in
/// constant, so an embedder can tune it per file type.
pub fn should_send_delta(stats: &DiffStats, full_line_count: usize, threshold_fraction: f64) -> bool {
    if full_line_count == 0 {
        return false;
    }
    (stats.total_changed() as f64 / full_line_count as f64) <= threshold_fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_tools::FileWriteTool;
    use agentkit_types::ParamValue;
    use std::path::PathBuf;

    fn write_params(file_path: &str, content: &str) -> ParamMap {
        vec![
            ("file_path".into(), ParamValue::String(file_path.into())),
            ("content".into(), ParamValue::String(content.into())),
            ("overwrite".into(), ParamValue::Bool(true)),
        ]
    }

    #[tokio::test]
    async fn speculating_a_new_file_has_no_original_content() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let engine = AutoExecEngine::new(EngineConfig::default());
        let exec = engine
            .speculate(&FileWriteTool, "c1", "writing a new file", write_params("a.txt", "hello"), &ctx)
            .await
            .unwrap();
        assert!(exec.proposal.pre_executed);
        assert_eq!(exec.proposal.pre_execution_state.unwrap().original_content, None);
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "hello");
    }

    #[tokio::test]
    async fn speculating_over_an_existing_file_captures_its_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "old").unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let engine = AutoExecEngine::new(EngineConfig::default());
        let exec = engine
            .speculate(&FileWriteTool, "c1", "overwriting", write_params("a.txt", "new"), &ctx)
            .await
            .unwrap();
        assert_eq!(
            exec.proposal.pre_execution_state.unwrap().original_content.as_deref(),
            Some("old")
        );
        assert_eq!(exec.diff.lines_added, 1);
        assert_eq!(exec.diff.lines_removed, 1);
    }

    #[test]
    fn eligibility_matches_default_allowlist() {
        let engine = AutoExecEngine::new(EngineConfig::default());
        assert!(engine.is_eligible("file.write"));
        assert!(engine.is_eligible("file.edit"));
        assert!(!engine.is_eligible("system.exec"));
    }

    #[test]
    fn small_diffs_prefer_delta_payloads() {
        let stats = DiffStats {
            lines_added: 1,
            lines_removed: 1,
            lines_unchanged: 98,
        };
        assert!(should_send_delta(&stats, 100, 0.1));
        assert!(!should_send_delta(&stats, 10, 0.05));
    }
}
