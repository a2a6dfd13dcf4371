//! Job-table contract backing the `system.exec*` tool family.
//!
//! `system.exec` hands back a job id immediately instead of blocking for
//! the command's lifetime; `exec_status`/`exec_wait`/`exec_kill`/`exec_list`
//! all operate on that id. Real process supervision is out of scope for
//! this workspace, so the tools hold an injected `Arc<dyn ExecJobs>` and
//! the registry is wired up with [`StubExecJobs`] by default.

use async_trait::async_trait;

use agentkit_error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecJobStatus {
    Running,
    Exited { code: i32 },
    Killed,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct ExecJobInfo {
    pub job_id: String,
    pub command: String,
    pub status: ExecJobStatus,
    pub stdout_tail: String,
    pub stderr_tail: String,
}

/// The job-table contract. One implementation per deployment; tests get
/// [`StubExecJobs`].
#[async_trait]
pub trait ExecJobs: Send + Sync {
    async fn spawn(&self, command: &str, timeout_seconds: Option<i64>) -> Result<String, CoreError>;
    async fn status(&self, job_id: &str) -> Result<ExecJobInfo, CoreError>;
    async fn wait(&self, job_id: &str) -> Result<ExecJobInfo, CoreError>;
    async fn kill(&self, job_id: &str) -> Result<(), CoreError>;
    async fn list(&self) -> Result<Vec<ExecJobInfo>, CoreError>;
}

fn no_backend(job_id: &str) -> CoreError {
    CoreError::ToolExecution {
        message: format!("no exec backend wired up in this deployment (job '{job_id}')"),
    }
}

/// Always-erroring implementation: gives the tool family its correct
/// shape (a job id comes back, later calls reference it by id) without a
/// real process supervisor behind it.
#[derive(Default)]
pub struct StubExecJobs;

#[async_trait]
impl ExecJobs for StubExecJobs {
    async fn spawn(&self, _command: &str, _timeout_seconds: Option<i64>) -> Result<String, CoreError> {
        Err(no_backend("<unassigned>"))
    }

    async fn status(&self, job_id: &str) -> Result<ExecJobInfo, CoreError> {
        Err(no_backend(job_id))
    }

    async fn wait(&self, job_id: &str) -> Result<ExecJobInfo, CoreError> {
        Err(no_backend(job_id))
    }

    async fn kill(&self, job_id: &str) -> Result<(), CoreError> {
        Err(no_backend(job_id))
    }

    async fn list(&self) -> Result<Vec<ExecJobInfo>, CoreError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_reports_no_backend_and_empty_list() {
        let jobs = StubExecJobs;
        assert!(jobs.spawn("echo hi", None).await.is_err());
        assert!(jobs.status("job_1").await.is_err());
        assert_eq!(jobs.list().await.unwrap().len(), 0);
    }
}
