//! `file.move`: rename/move a workspace file.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use agentkit_error::CoreError;
use agentkit_types::{param_get, Effect, ParamMap, ParamSchema, ParamType, ToolOp, ToolSpec};

use crate::context::ToolContext;
use crate::tool::{Tool, ToolOutput};

static SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "file.move".into(),
    version: 1,
    description: "Move or rename a workspace file.".into(),
    effects: [Effect::Disk].into_iter().collect(),
    input_schema: vec![
        ParamSchema::required("source_path", ParamType::String, "workspace-relative source path"),
        ParamSchema::required("dest_path", ParamType::String, "workspace-relative destination path"),
        ParamSchema::optional("overwrite", ParamType::Boolean, "allow overwriting an existing destination (default false)"),
    ],
    output_description: "the source and destination paths".into(),
});

#[derive(Default)]
pub struct FileMoveTool;

#[async_trait]
impl Tool for FileMoveTool {
    fn spec(&self) -> &ToolSpec {
        &SPEC
    }

    async fn execute(&self, params: &ParamMap, ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let source_path = param_get(params, "source_path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::TypeError {
                param: "source_path".into(),
                expected: "string".into(),
                message: "missing required parameter".into(),
            })?;
        let dest_path = param_get(params, "dest_path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::TypeError {
                param: "dest_path".into(),
                expected: "string".into(),
                message: "missing required parameter".into(),
            })?;
        let overwrite = param_get(params, "overwrite").and_then(|v| v.as_bool()).unwrap_or(false);

        let (src_abs, src_rel) = ctx.resolve(source_path)?;
        let (dst_abs, dst_rel) = ctx.resolve(dest_path)?;
        if dst_abs.exists() && !overwrite {
            return Err(CoreError::ToolExecution {
                message: format!("'{dst_rel}' already exists; pass overwrite=true to replace it"),
            });
        }
        let before = tokio::fs::read_to_string(&src_abs)
            .await
            .map_err(|source| CoreError::Io { path: src_rel.clone(), source })?;

        if let Some(parent) = dst_abs.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CoreError::Io { path: dst_rel.clone(), source })?;
        }
        tokio::fs::rename(&src_abs, &dst_abs)
            .await
            .map_err(|source| CoreError::Io { path: dst_rel.clone(), source })?;

        Ok(ToolOutput {
            summary: format!("moved {src_rel} -> {dst_rel}"),
            result: serde_json::json!({ "source_path": src_rel, "dest_path": dst_rel }),
            ops: vec![ToolOp {
                op_type: "file_move".into(),
                path: Some(dst_rel),
                before: Some(before),
                after: None,
                before_checkpoint_id: None,
                after_checkpoint_id: None,
                before_checkpoint_created: false,
                after_checkpoint_created: false,
                pre_executed: false,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_types::ParamValue;
    use std::path::PathBuf;

    #[tokio::test]
    async fn moves_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hi").unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let params: ParamMap = vec![
            ("source_path".into(), ParamValue::String("a.txt".into())),
            ("dest_path".into(), ParamValue::String("sub/b.txt".into())),
        ];
        FileMoveTool.execute(&params, &ctx).await.unwrap();
        assert!(!dir.path().join("a.txt").exists());
        assert_eq!(std::fs::read_to_string(dir.path().join("sub/b.txt")).unwrap(), "hi");
    }
}
