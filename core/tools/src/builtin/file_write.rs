//! `file.write`: create or overwrite a workspace file.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use agentkit_error::CoreError;
use agentkit_types::{param_get, Effect, ParamMap, ParamSchema, ParamType, ToolOp, ToolSpec};

use crate::context::ToolContext;
use crate::tool::{Tool, ToolOutput};

static SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "file.write".into(),
    version: 1,
    description: "Create a file, or overwrite one if `overwrite` is set.".into(),
    effects: [Effect::Disk].into_iter().collect(),
    input_schema: vec![
        ParamSchema::required("file_path", ParamType::String, "workspace-relative path to write"),
        ParamSchema::required("content", ParamType::String, "full file content"),
        ParamSchema::optional("overwrite", ParamType::Boolean, "allow overwriting an existing file (default false)"),
    ],
    output_description: "whether the file was created or overwritten, and any parent directories created".into(),
});

#[derive(Default)]
pub struct FileWriteTool;

#[async_trait]
impl Tool for FileWriteTool {
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
        let content = param_get(params, "content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::TypeError {
                param: "content".into(),
                expected: "string".into(),
                message: "missing required parameter".into(),
            })?;
        let overwrite = param_get(params, "overwrite").and_then(|v| v.as_bool()).unwrap_or(false);

        let (abs_path, rel_path) = ctx.resolve(file_path)?;
        let existed = abs_path.exists();
        if existed && !overwrite {
            return Err(CoreError::ToolExecution {
                message: format!("'{rel_path}' already exists; pass overwrite=true to replace it"),
            });
        }
        let before = if existed {
            Some(
                tokio::fs::read_to_string(&abs_path)
                    .await
                    .map_err(|source| CoreError::Io { path: rel_path.clone(), source })?,
            )
        } else {
            None
        };

        let mut created_dirs = Vec::new();
        if let Some(parent) = abs_path.parent() {
            if !parent.exists() {
                // Walk up from `parent` collecting every directory level
                // that doesn't exist yet, innermost first, so a later
                // revert can remove exactly what this call created.
                let mut missing = Vec::new();
                let mut cursor = Some(parent);
                while let Some(dir) = cursor {
                    if dir.exists() {
                        break;
                    }
                    missing.push(dir.to_string_lossy().to_string());
                    cursor = dir.parent();
                }
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| CoreError::Io { path: rel_path.clone(), source })?;
                created_dirs = missing;
            }
        }
        tokio::fs::write(&abs_path, content)
            .await
            .map_err(|source| CoreError::Io { path: rel_path.clone(), source })?;

        let summary = if existed {
            format!("overwrote {rel_path}")
        } else {
            format!("created {rel_path}")
        };
        Ok(ToolOutput {
            result: serde_json::json!({
                "file_path": rel_path,
                "existed": existed,
                "created_dirs": created_dirs,
            }),
            summary,
            ops: vec![ToolOp {
                op_type: "file_write".into(),
                path: Some(rel_path),
                before,
                after: Some(content.to_string()),
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
    use std::path::PathBuf;

    fn params(file_path: &str, content: &str, overwrite: bool) -> ParamMap {
        vec![
            ("file_path".into(), agentkit_types::ParamValue::String(file_path.into())),
            ("content".into(), agentkit_types::ParamValue::String(content.into())),
            ("overwrite".into(), agentkit_types::ParamValue::Bool(overwrite)),
        ]
    }

    #[tokio::test]
    async fn creates_new_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let out = FileWriteTool.execute(&params("sub/a.txt", "hi", false), &ctx).await.unwrap();
        assert_eq!(out.result["existed"], false);
        assert_eq!(std::fs::read_to_string(dir.path().join("sub/a.txt")).unwrap(), "hi");
    }

    #[tokio::test]
    async fn records_every_directory_level_it_created_innermost_first() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let out = FileWriteTool.execute(&params("a/b/c/file.txt", "hi", false), &ctx).await.unwrap();
        let created_dirs: Vec<String> =
            out.result["created_dirs"].as_array().unwrap().iter().map(|v| v.as_str().unwrap().to_string()).collect();
        assert_eq!(created_dirs.len(), 3);
        assert!(created_dirs[0].ends_with("a/b/c") || created_dirs[0].ends_with("a\\b\\c"));
        assert!(created_dirs[2].ends_with('a'));
    }

    #[tokio::test]
    async fn no_dirs_recorded_when_parent_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let out = FileWriteTool.execute(&params("a.txt", "hi", false), &ctx).await.unwrap();
        assert!(out.result["created_dirs"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn refuses_overwrite_without_flag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "old").unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        assert!(matches!(
            FileWriteTool.execute(&params("a.txt", "new", false), &ctx).await,
            Err(CoreError::ToolExecution { .. })
        ));
    }

    #[tokio::test]
    async fn overwrite_captures_before_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "old").unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let out = FileWriteTool.execute(&params("a.txt", "new", true), &ctx).await.unwrap();
        assert_eq!(out.ops[0].before.as_deref(), Some("old"));
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "new");
    }
}
