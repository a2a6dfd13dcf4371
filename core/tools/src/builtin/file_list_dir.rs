//! `file.list_dir`: list entries in a workspace directory.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use agentkit_error::CoreError;
use agentkit_types::{param_get, Effect, ParamMap, ParamSchema, ParamType, ToolSpec};

use crate::context::ToolContext;
use crate::tool::{Tool, ToolOutput};

static SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "file.list_dir".into(),
    version: 1,
    description: "List the entries of a workspace directory, non-recursively.".into(),
    effects: [Effect::Disk].into_iter().collect(),
    input_schema: vec![ParamSchema::optional(
        "dir_path",
        ParamType::String,
        "workspace-relative directory (default: workspace root)",
    )],
    output_description: "entry names with a kind of 'file' or 'dir'".into(),
});

#[derive(Default)]
pub struct FileListDirTool;

#[async_trait]
impl Tool for FileListDirTool {
    fn spec(&self) -> &ToolSpec {
        &SPEC
    }

    async fn execute(&self, params: &ParamMap, ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let dir_path = param_get(params, "dir_path").and_then(|v| v.as_str()).unwrap_or(".");
        let (abs_path, rel_path) = ctx.resolve(dir_path)?;

        let mut entries = tokio::fs::read_dir(&abs_path)
            .await
            .map_err(|source| CoreError::Io { path: rel_path.clone(), source })?;
        let mut listing = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| CoreError::Io { path: rel_path.clone(), source })?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|source| CoreError::Io { path: rel_path.clone(), source })?;
            listing.push(serde_json::json!({
                "name": entry.file_name().to_string_lossy(),
                "kind": if file_type.is_dir() { "dir" } else { "file" },
            }));
        }
        listing.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

        Ok(ToolOutput {
            summary: format!("{} entries in {rel_path}", listing.len()),
            result: serde_json::json!({ "dir_path": rel_path, "entries": listing }),
            ops: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn lists_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let out = FileListDirTool.execute(&Vec::new(), &ctx).await.unwrap();
        let entries = out.result["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
    }
}
