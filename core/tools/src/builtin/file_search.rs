//! `file.search`: find files by name/glob under the workspace.

use async_trait::async_trait;
use once_cell::sync::Lazy;

use agentkit_error::CoreError;
use agentkit_types::{param_get, Effect, ParamMap, ParamSchema, ParamType, ToolSpec};

use crate::context::ToolContext;
use crate::tool::{Tool, ToolOutput};

static SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "file.search".into(),
    version: 1,
    description: "Find workspace files whose path contains a substring.".into(),
    effects: [Effect::Disk].into_iter().collect(),
    input_schema: vec![
        ParamSchema::required("pattern", ParamType::String, "substring to match against workspace-relative paths"),
        ParamSchema::optional("max_results", ParamType::Integer, "cap on returned matches (default 100)"),
    ],
    output_description: "workspace-relative paths matching the pattern".into(),
});

#[derive(Default)]
pub struct FileSearchTool;

#[async_trait]
impl Tool for FileSearchTool {
    fn spec(&self) -> &ToolSpec {
        &SPEC
    }

    async fn execute(&self, params: &ParamMap, ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let pattern = param_get(params, "pattern")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::TypeError {
                param: "pattern".into(),
                expected: "string".into(),
                message: "missing required parameter".into(),
            })?;
        let max_results = param_get(params, "max_results").and_then(|v| v.as_i64()).unwrap_or(100).max(0) as usize;

        let root = ctx.workspace_path.clone().unwrap_or_else(|| std::path::PathBuf::from("."));
        let mut matches = Vec::new();
        walk(&root, &root, pattern, max_results, &mut matches).await?;

        Ok(ToolOutput {
            summary: format!("{} match(es) for '{pattern}'", matches.len()),
            result: serde_json::json!({ "matches": matches }),
            ops: Vec::new(),
        })
    }
}

fn walk<'a>(
    root: &'a std::path::Path,
    dir: &'a std::path::Path,
    pattern: &'a str,
    max_results: usize,
    out: &'a mut Vec<String>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), CoreError>> + Send + 'a>> {
    Box::pin(async move {
        if out.len() >= max_results {
            return Ok(());
        }
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|source| CoreError::Io {
            path: dir.to_string_lossy().to_string(),
            source,
        })?;
        while let Some(entry) = entries.next_entry().await.map_err(|source| CoreError::Io {
            path: dir.to_string_lossy().to_string(),
            source,
        })? {
            if out.len() >= max_results {
                return Ok(());
            }
            let path = entry.path();
            let rel = path.strip_prefix(root).unwrap_or(&path).to_string_lossy().replace('\\', "/");
            let file_type = entry.file_type().await.map_err(|source| CoreError::Io {
                path: rel.clone(),
                source,
            })?;
            if file_type.is_dir() {
                walk(root, &path, pattern, max_results, out).await?;
            } else if rel.contains(pattern) {
                out.push(rel);
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_types::ParamValue;
    use std::path::PathBuf;

    #[tokio::test]
    async fn finds_nested_matches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();
        let ctx = ToolContext::new(Some(PathBuf::from(dir.path())));
        let params: ParamMap = vec![("pattern".into(), ParamValue::String(".rs".into()))];
        let out = FileSearchTool.execute(&params, &ctx).await.unwrap();
        let matches = out.result["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 1);
        assert!(matches[0].as_str().unwrap().ends_with("src/lib.rs"));
    }
}
