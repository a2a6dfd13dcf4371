//! Tools whose interfaces are specified but whose backing systems (a
//! notebook kernel, an LLM provider, a job runner, a search index, an image
//! model) are out of scope here. Each registers a real [`ToolSpec`] so the
//! catalog and parser see a complete picture, and returns a
//! [`CoreError::ToolExecution`] explaining that no backend is wired up,
//! rather than silently no-op'ing.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;

use agentkit_error::CoreError;
use agentkit_types::{param_get, Effect, ParamMap, ParamSchema, ParamType, ToolSpec};

use crate::context::ToolContext;
use crate::exec_jobs::{ExecJobInfo, ExecJobStatus, ExecJobs, StubExecJobs};
use crate::tool::{Tool, ToolOutput};

macro_rules! stub_tool {
    ($ty:ident, $spec_static:ident, $name:expr, $desc:expr, $effects:expr, $schema:expr, $out_desc:expr) => {
        static $spec_static: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
            name: $name.into(),
            version: 1,
            description: $desc.into(),
            effects: $effects.into_iter().collect(),
            input_schema: $schema,
            output_description: $out_desc.into(),
        });

        #[derive(Default)]
        pub struct $ty;

        #[async_trait]
        impl Tool for $ty {
            fn spec(&self) -> &ToolSpec {
                &$spec_static
            }

            async fn execute(&self, _params: &ParamMap, _ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
                Err(CoreError::ToolExecution {
                    message: format!("'{}' has no backend wired up in this deployment", $name),
                })
            }
        }
    };
}

stub_tool!(
    FileMoveLinesTool,
    MOVE_LINES_SPEC,
    "file.move_lines",
    "Move a line range from one file to another, preserving indentation.",
    [Effect::Disk],
    vec![
        ParamSchema::required("source_path", ParamType::String, "source file"),
        ParamSchema::required("start_line", ParamType::Integer, "1-indexed start"),
        ParamSchema::required("end_line", ParamType::Integer, "1-indexed end"),
        ParamSchema::required("dest_path", ParamType::String, "destination file"),
        ParamSchema::required("dest_line", ParamType::Integer, "1-indexed insertion point in dest_path"),
    ],
    "the updated source and destination content"
);

stub_tool!(
    FileNotebookEditTool,
    NOTEBOOK_EDIT_SPEC,
    "file.notebook_edit",
    "Edit a single cell of a Jupyter notebook.",
    [Effect::Disk],
    vec![
        ParamSchema::required("file_path", ParamType::String, "notebook path"),
        ParamSchema::required("cell_index", ParamType::Integer, "0-indexed cell to edit"),
        ParamSchema::required("new_source", ParamType::String, "replacement cell source"),
    ],
    "the updated notebook cell"
);

stub_tool!(
    FileAttachTool,
    ATTACH_SPEC,
    "file.attach",
    "Attach a workspace file to the conversation as a reference artifact.",
    [Effect::Disk, Effect::Context],
    vec![ParamSchema::required("file_path", ParamType::String, "workspace-relative path to attach")],
    "an attachment identifier"
);

stub_tool!(
    LlmGenerateTool,
    LLM_GENERATE_SPEC,
    "llm.generate",
    "Delegate a sub-generation to a language model.",
    [Effect::Net],
    vec![
        ParamSchema::required("prompt", ParamType::String, "prompt text"),
        ParamSchema::optional("max_tokens", ParamType::Integer, "generation length ceiling"),
    ],
    "generated text"
);

static SYSTEM_EXEC_SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "system.exec".into(),
    version: 1,
    description: "Run a workspace-scoped shell command as a tracked job.".into(),
    effects: [Effect::Exec].into_iter().collect(),
    input_schema: vec![
        ParamSchema::required("command", ParamType::String, "command line to run"),
        ParamSchema::optional("timeout_seconds", ParamType::Integer, "kill the job after this many seconds"),
    ],
    output_description: "a job id; poll with system.exec_status".into(),
});

/// `system.exec`: hands back a job id immediately rather than blocking for
/// the command's lifetime. Delegates to an injected [`ExecJobs`] so the
/// tool itself carries no process-supervision logic.
pub struct SystemExecTool {
    jobs: Arc<dyn ExecJobs>,
}

impl SystemExecTool {
    pub fn new(jobs: Arc<dyn ExecJobs>) -> Self {
        Self { jobs }
    }
}

impl Default for SystemExecTool {
    fn default() -> Self {
        Self::new(Arc::new(StubExecJobs))
    }
}

#[async_trait]
impl Tool for SystemExecTool {
    fn spec(&self) -> &ToolSpec {
        &SYSTEM_EXEC_SPEC
    }

    async fn execute(&self, params: &ParamMap, _ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let command = param_get(params, "command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::TypeError {
                param: "command".into(),
                expected: "string".into(),
                message: "missing".into(),
            })?;
        let timeout_seconds = param_get(params, "timeout_seconds").and_then(|v| v.as_i64());
        let job_id = self.jobs.spawn(command, timeout_seconds).await?;
        Ok(ToolOutput::text(job_id))
    }
}

static SYSTEM_EXEC_STATUS_SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "system.exec_status".into(),
    version: 1,
    description: "Check a job's current state without blocking.".into(),
    effects: [Effect::Exec].into_iter().collect(),
    input_schema: vec![ParamSchema::required("job_id", ParamType::String, "id returned by system.exec")],
    output_description: "status, and a tail of stdout/stderr".into(),
});

pub struct SystemExecStatusTool {
    jobs: Arc<dyn ExecJobs>,
}

impl SystemExecStatusTool {
    pub fn new(jobs: Arc<dyn ExecJobs>) -> Self {
        Self { jobs }
    }
}

impl Default for SystemExecStatusTool {
    fn default() -> Self {
        Self::new(Arc::new(StubExecJobs))
    }
}

#[async_trait]
impl Tool for SystemExecStatusTool {
    fn spec(&self) -> &ToolSpec {
        &SYSTEM_EXEC_STATUS_SPEC
    }

    async fn execute(&self, params: &ParamMap, _ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let job_id = required_job_id(params)?;
        let info = self.jobs.status(job_id).await?;
        Ok(job_info_output(&info))
    }
}

static SYSTEM_EXEC_WAIT_SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "system.exec_wait".into(),
    version: 1,
    description: "Block until a job reaches a terminal state.".into(),
    effects: [Effect::Exec].into_iter().collect(),
    input_schema: vec![ParamSchema::required("job_id", ParamType::String, "id returned by system.exec")],
    output_description: "the job's terminal status, and a tail of stdout/stderr".into(),
});

pub struct SystemExecWaitTool {
    jobs: Arc<dyn ExecJobs>,
}

impl SystemExecWaitTool {
    pub fn new(jobs: Arc<dyn ExecJobs>) -> Self {
        Self { jobs }
    }
}

impl Default for SystemExecWaitTool {
    fn default() -> Self {
        Self::new(Arc::new(StubExecJobs))
    }
}

#[async_trait]
impl Tool for SystemExecWaitTool {
    fn spec(&self) -> &ToolSpec {
        &SYSTEM_EXEC_WAIT_SPEC
    }

    async fn execute(&self, params: &ParamMap, _ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let job_id = required_job_id(params)?;
        let info = self.jobs.wait(job_id).await?;
        Ok(job_info_output(&info))
    }
}

static SYSTEM_EXEC_KILL_SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "system.exec_kill".into(),
    version: 1,
    description: "Terminate a running job.".into(),
    effects: [Effect::Exec].into_iter().collect(),
    input_schema: vec![ParamSchema::required("job_id", ParamType::String, "id returned by system.exec")],
    output_description: "confirmation that the kill signal was sent".into(),
});

pub struct SystemExecKillTool {
    jobs: Arc<dyn ExecJobs>,
}

impl SystemExecKillTool {
    pub fn new(jobs: Arc<dyn ExecJobs>) -> Self {
        Self { jobs }
    }
}

impl Default for SystemExecKillTool {
    fn default() -> Self {
        Self::new(Arc::new(StubExecJobs))
    }
}

#[async_trait]
impl Tool for SystemExecKillTool {
    fn spec(&self) -> &ToolSpec {
        &SYSTEM_EXEC_KILL_SPEC
    }

    async fn execute(&self, params: &ParamMap, _ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let job_id = required_job_id(params)?;
        self.jobs.kill(job_id).await?;
        Ok(ToolOutput::text(format!("killed {job_id}")))
    }
}

static SYSTEM_EXEC_LIST_SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "system.exec_list".into(),
    version: 1,
    description: "List jobs tracked for the current session.".into(),
    effects: [Effect::Exec].into_iter().collect(),
    input_schema: vec![],
    output_description: "one entry per tracked job".into(),
});

pub struct SystemExecListTool {
    jobs: Arc<dyn ExecJobs>,
}

impl SystemExecListTool {
    pub fn new(jobs: Arc<dyn ExecJobs>) -> Self {
        Self { jobs }
    }
}

impl Default for SystemExecListTool {
    fn default() -> Self {
        Self::new(Arc::new(StubExecJobs))
    }
}

#[async_trait]
impl Tool for SystemExecListTool {
    fn spec(&self) -> &ToolSpec {
        &SYSTEM_EXEC_LIST_SPEC
    }

    async fn execute(&self, _params: &ParamMap, _ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let jobs = self.jobs.list().await?;
        let result = serde_json::Value::Array(jobs.iter().map(job_info_json).collect());
        Ok(ToolOutput {
            summary: format!("{} tracked job(s)", jobs.len()),
            result,
            ops: Vec::new(),
        })
    }
}

fn required_job_id(params: &ParamMap) -> Result<&str, CoreError> {
    param_get(params, "job_id").and_then(|v| v.as_str()).ok_or_else(|| CoreError::TypeError {
        param: "job_id".into(),
        expected: "string".into(),
        message: "missing".into(),
    })
}

fn status_label(status: &ExecJobStatus) -> String {
    match status {
        ExecJobStatus::Running => "running".to_string(),
        ExecJobStatus::Exited { code } => format!("exited({code})"),
        ExecJobStatus::Killed => "killed".to_string(),
        ExecJobStatus::TimedOut => "timed_out".to_string(),
    }
}

fn job_info_json(info: &ExecJobInfo) -> serde_json::Value {
    serde_json::json!({
        "job_id": info.job_id,
        "command": info.command,
        "status": status_label(&info.status),
        "stdout_tail": info.stdout_tail,
        "stderr_tail": info.stderr_tail,
    })
}

fn job_info_output(info: &ExecJobInfo) -> ToolOutput {
    ToolOutput {
        summary: format!("job {} is {}", info.job_id, status_label(&info.status)),
        result: job_info_json(info),
        ops: Vec::new(),
    }
}

stub_tool!(
    RagIndexTool,
    RAG_INDEX_SPEC,
    "rag.index",
    "Index workspace content for later retrieval.",
    [Effect::Disk, Effect::Context],
    vec![ParamSchema::optional("paths", ParamType::Array, "paths to index (default: whole workspace)")],
    "number of documents indexed"
);

stub_tool!(
    RagSearchTool,
    RAG_SEARCH_SPEC,
    "rag.search",
    "Search previously indexed workspace content.",
    [Effect::Context],
    vec![
        ParamSchema::required("query", ParamType::String, "search query"),
        ParamSchema::optional("top_k", ParamType::Integer, "max results (default 5)"),
    ],
    "ranked passages with source paths"
);

stub_tool!(
    WebSearchTool,
    WEB_SEARCH_SPEC,
    "web.search",
    "Search the web for reference material.",
    [Effect::Net],
    vec![ParamSchema::required("query", ParamType::String, "search query")],
    "ranked web results with titles, urls, and snippets"
);

stub_tool!(
    MediaImageGenerateTool,
    IMAGE_GENERATE_SPEC,
    "media.image_generate",
    "Generate an image from a text description.",
    [Effect::Net],
    vec![
        ParamSchema::required("prompt", ParamType::String, "image description"),
        ParamSchema::optional("aspect_ratio", ParamType::String, "e.g. '16:9' (default '1:1')"),
    ],
    "a reference to the generated image"
);
