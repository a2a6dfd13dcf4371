//! `file.grep`: regex search over a single file's content.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use agentkit_error::CoreError;
use agentkit_types::{param_get, Effect, ParamMap, ParamSchema, ParamType, ToolSpec};

use crate::context::ToolContext;
use crate::tool::{Tool, ToolOutput};

static SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "file.grep".into(),
    version: 1,
    description: "Search a workspace file's lines against a regex pattern.".into(),
    effects: [Effect::Disk].into_iter().collect(),
    input_schema: vec![
        ParamSchema::required("file_path", ParamType::String, "workspace-relative path to search"),
        ParamSchema::required("pattern", ParamType::String, "regex pattern"),
        ParamSchema::optional("max_matches", ParamType::Integer, "cap on returned matches (default 200)"),
    ],
    output_description: "matching line numbers and text".into(),
});

#[derive(Default)]
pub struct FileGrepTool;

#[async_trait]
impl Tool for FileGrepTool {
    fn spec(&self) -> &ToolSpec {
        &SPEC
    }

    async fn execute(&self, params: &ParamMap, ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let file_path = param_get(params, "file_path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::TypeError {
                param: "file_path".into(),
                expected: "string".into(),
                message: "missing required parameter".into(),
            })?;
        let pattern = param_get(params, "pattern")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::TypeError {
                param: "pattern".into(),
                expected: "string".into(),
                message: "missing required parameter".into(),
            })?;
        let max_matches = param_get(params, "max_matches").and_then(|v| v.as_i64()).unwrap_or(200).max(0) as usize;

        let (abs_path, rel_path) = ctx.resolve(file_path)?;
        let content = tokio::fs::read_to_string(&abs_path)
            .await
            .map_err(|source| CoreError::Io { path: rel_path.clone(), source })?;
        let re = Regex::new(pattern).map_err(|e| CoreError::ToolExecution {
            message: format!("invalid regex '{pattern}': {e}"),
        })?;

        let matches: Vec<serde_json::Value> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| re.is_match(line))
            .take(max_matches)
            .map(|(i, line)| serde_json::json!({ "line": i + 1, "text": line }))
            .collect();

        Ok(ToolOutput {
            summary: format!("{} match(es) in {rel_path}", matches.len()),
            result: serde_json::json!({ "file_path": rel_path, "matches": matches }),
            ops: Vec::new(),
        })
    }
}
