//! `file.edit`: two mutually exclusive modes, `find_replace`
//! and `line_range`, both built on [`crate::edit_ops`].

use async_trait::async_trait;
use once_cell::sync::Lazy;

use agentkit_error::CoreError;
use agentkit_types::{param_get, Effect, ParamMap, ParamSchema, ParamType, ToolOp, ToolSpec};

use crate::context::ToolContext;
use crate::edit_ops::{apply_find_replace, apply_line_range};
use crate::tool::{Tool, ToolOutput};

static SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "file.edit".into(),
    version: 1,
    description: "Edit an existing workspace file, by find_replace or by line_range.".into(),
    effects: [Effect::Disk].into_iter().collect(),
    input_schema: vec![
        ParamSchema::required("file_path", ParamType::String, "workspace-relative path to edit"),
        ParamSchema::required("edit_mode", ParamType::String, "either 'find_replace' or 'line_range'")
            .with_enum(["find_replace", "line_range"]),
        ParamSchema::optional("find_text", ParamType::String, "text or pattern to find (find_replace mode)"),
        ParamSchema::optional("replace_text", ParamType::String, "replacement text (find_replace mode)"),
        ParamSchema::optional("use_regex", ParamType::Boolean, "treat find_text as a regex (find_replace mode)"),
        ParamSchema::optional("replace_all", ParamType::Boolean, "replace every occurrence, not just the first"),
        ParamSchema::optional("start_line", ParamType::Integer, "1-indexed inclusive start (line_range mode)"),
        ParamSchema::optional("end_line", ParamType::Integer, "1-indexed inclusive end (line_range mode)"),
        ParamSchema::optional("new_content", ParamType::String, "replacement content (line_range mode)"),
    ],
    output_description: "count of changes applied and the resulting diff summary".into(),
});

#[derive(Default)]
pub struct FileEditTool;

#[async_trait]
impl Tool for FileEditTool {
    fn spec(&self) -> &ToolSpec {
        &SPEC
    }

    async fn execute(&self, params: &ParamMap, ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let file_path = required_str(params, "file_path")?;
        let edit_mode = required_str(params, "edit_mode")?;

        let (abs_path, rel_path) = ctx.resolve(file_path)?;
        let before = tokio::fs::read_to_string(&abs_path)
            .await
            .map_err(|source| CoreError::Io { path: rel_path.clone(), source })?;

        let (after, summary) = match edit_mode {
            "find_replace" => {
                let find_text = required_str(params, "find_text")?;
                let replace_text = required_str(params, "replace_text")?;
                let use_regex = param_get(params, "use_regex").and_then(|v| v.as_bool()).unwrap_or(false);
                let replace_all = param_get(params, "replace_all").and_then(|v| v.as_bool()).unwrap_or(false);
                let (content, applied) =
                    apply_find_replace(&before, find_text, replace_text, use_regex, replace_all)?;
                (content, format!("{applied} replacement(s) in {rel_path}"))
            }
            "line_range" => {
                let start_line = required_i64(params, "start_line")? as usize;
                let end_line = required_i64(params, "end_line")? as usize;
                let new_content = required_str(params, "new_content")?;
                let content = apply_line_range(&before, start_line, end_line, new_content)?;
                (content, format!("replaced lines {start_line}-{end_line} in {rel_path}"))
            }
            other => {
                return Err(CoreError::TypeError {
                    param: "edit_mode".into(),
                    expected: "find_replace | line_range".into(),
                    message: format!("unrecognized edit_mode '{other}'"),
                });
            }
        };

        tokio::fs::write(&abs_path, &after)
            .await
            .map_err(|source| CoreError::Io { path: rel_path.clone(), source })?;

        Ok(ToolOutput {
            result: serde_json::json!({ "file_path": rel_path, "edit_mode": edit_mode }),
            summary,
            ops: vec![ToolOp {
                op_type: "file_edit".into(),
                path: Some(rel_path),
                before: Some(before),
                after: Some(after),
                before_checkpoint_id: None,
                after_checkpoint_id: None,
                before_checkpoint_created: false,
                after_checkpoint_created: false,
                pre_executed: false,
            }],
        })
    }
}

fn required_str<'a>(params: &'a ParamMap, name: &str) -> Result<&'a str, CoreError> {
    param_get(params, name).and_then(|v| v.as_str()).ok_or_else(|| CoreError::TypeError {
        param: name.to_string(),
        expected: "string".into(),
        message: "missing required parameter".into(),
    })
}

fn required_i64(params: &ParamMap, name: &str) -> Result<i64, CoreError> {
    param_get(params, name).and_then(|v| v.as_i64()).ok_or_else(|| CoreError::TypeError {
        param: name.to_string(),
        expected: "integer".into(),
        message: "missing required parameter".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_types::ParamValue;
    use std::path::PathBuf;

    #[tokio::test]
    async fn find_replace_edits_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "foo bar foo").unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let params: ParamMap = vec![
            ("file_path".into(), ParamValue::String("a.txt".into())),
            ("edit_mode".into(), ParamValue::String("find_replace".into())),
            ("find_text".into(), ParamValue::String("foo".into())),
            ("replace_text".into(), ParamValue::String("baz".into())),
            ("replace_all".into(), ParamValue::Bool(true)),
        ];
        FileEditTool.execute(&params, &ctx).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "baz bar baz");
    }

    #[tokio::test]
    async fn line_range_edits_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a\nb\nc").unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let params: ParamMap = vec![
            ("file_path".into(), ParamValue::String("a.txt".into())),
            ("edit_mode".into(), ParamValue::String("line_range".into())),
            ("start_line".into(), ParamValue::Int(2)),
            ("end_line".into(), ParamValue::Int(2)),
            ("new_content".into(), ParamValue::String("X".into())),
        ];
        FileEditTool.execute(&params, &ctx).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "a\nX\nc");
    }

    #[tokio::test]
    async fn unknown_mode_is_type_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let params: ParamMap = vec![
            ("file_path".into(), ParamValue::String("a.txt".into())),
            ("edit_mode".into(), ParamValue::String("rewrite_everything".into())),
        ];
        assert!(matches!(
            FileEditTool.execute(&params, &ctx).await,
            Err(CoreError::TypeError { .. })
        ));
    }
}
