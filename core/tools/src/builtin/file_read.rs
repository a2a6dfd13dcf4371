//! `file.read`: read a workspace file, with a size ceiling.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use agentkit_error::CoreError;
use agentkit_types::{param_get, ParamMap, ParamType, ParamSchema, ToolSpec, Effect};

use crate::context::ToolContext;
use crate::tool::{Tool, ToolOutput};

const DEFAULT_MAX_SIZE_MB: i64 = 5;

static SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "file.read".into(),
    version: 1,
    description: "Read the contents of a workspace file.".into(),
    effects: [Effect::Disk].into_iter().collect(),
    input_schema: vec![
        ParamSchema::required("file_path", ParamType::String, "workspace-relative path to read"),
        ParamSchema::optional(
            "max_size_mb",
            ParamType::Integer,
            "reject files larger than this many megabytes (default 5)",
        ),
        ParamSchema::optional(
            "force_reread",
            ParamType::Boolean,
            "bypass any duplicate-read shortcut and always return full content",
        ),
    ],
    output_description: "file content plus byte length and line count, or a duplicate marker".into(),
});

#[derive(Default)]
pub struct FileReadTool;

#[async_trait]
impl Tool for FileReadTool {
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
        let max_size_mb = param_get(params, "max_size_mb")
            .and_then(|v| v.as_i64())
            .unwrap_or(DEFAULT_MAX_SIZE_MB);
        let limit = (max_size_mb.max(0) as usize) * 1024 * 1024;

        let (abs_path, rel_path) = ctx.resolve(file_path)?;
        let bytes = tokio::fs::read(&abs_path).await.map_err(|source| CoreError::Io {
            path: rel_path.clone(),
            source,
        })?;
        if bytes.len() > limit {
            return Err(CoreError::ContentTooLarge {
                path: rel_path,
                size: bytes.len(),
                limit,
            });
        }
        let content = String::from_utf8(bytes).map_err(|_| CoreError::BinaryFile {
            path: rel_path.clone(),
        })?;
        let line_count = content.lines().count();
        let summary = format!("read {} ({} bytes, {} lines)", rel_path, content.len(), line_count);
        Ok(ToolOutput {
            result: serde_json::json!({
                "file_path": rel_path,
                "content": content,
                "byte_length": content.len(),
                "line_count": line_count,
            }),
            summary,
            ops: Vec::new(),
        })
    }
}
