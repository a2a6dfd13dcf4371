//! Turns the model's tool-call proposals plus the user's accept/reject
//! decisions into history records. Auto-executed proposals are never
//! re-run — accept just keeps what already happened, reject reverts it.

use agentkit_checkpoint::CheckpointStore;
use agentkit_error::CoreError;
use agentkit_revert::{revert_find_replace_edit, revert_line_range_edit};
use agentkit_tools::{Tool, ToolContext, ToolRegistry};
use agentkit_types::{
    param_get, ExecutionPlan, ParamMap, PreExecutionState, TaskState, ToolCallProposal, ToolExecutionRecord, ToolOp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

/// Outcome of deciding one pending call. `stale` is set when `call_id`
/// didn't match any pending proposal — already decided, or the task moved
/// on — so the caller can surface a stale-request response instead of
/// treating it as an error.
pub struct DecisionOutcome {
    pub call_id: String,
    pub record: Option<ToolExecutionRecord>,
    pub plan_update: Option<ExecutionPlan>,
    pub stale: bool,
}

/// Decide a batch of pending tool calls for `task`, mutating its `pending`
/// and `history` in place and returning one outcome per requested call id.
pub async fn handle_tool_decisions(
    task: &mut TaskState,
    decisions: &[(String, Decision)],
    registry: &ToolRegistry,
    ctx: &ToolContext,
    checkpoints: &mut CheckpointStore,
) -> Result<Vec<DecisionOutcome>, CoreError> {
    let mut outcomes = Vec::with_capacity(decisions.len());
    let mut decided_ids = Vec::new();

    for (call_id, decision) in decisions {
        let Some(proposal) = task.pending_by_call_id(call_id).cloned() else {
            outcomes.push(DecisionOutcome {
                call_id: call_id.clone(),
                record: None,
                plan_update: None,
                stale: true,
            });
            continue;
        };

        let (record, plan_update) = match *decision {
            Decision::Accept => accept(task.domain_id.as_str(), &proposal, registry, ctx, checkpoints).await?,
            Decision::Reject => (reject(&proposal, ctx).await?, None),
        };

        decided_ids.push(call_id.clone());
        task.record_history(record.clone());
        outcomes.push(DecisionOutcome {
            call_id: call_id.clone(),
            record: Some(record),
            plan_update,
            stale: false,
        });
    }

    task.remove_pending(&decided_ids);
    Ok(outcomes)
}

async fn accept(
    domain: &str,
    proposal: &ToolCallProposal,
    registry: &ToolRegistry,
    ctx: &ToolContext,
    checkpoints: &mut CheckpointStore,
) -> Result<(ToolExecutionRecord, Option<ExecutionPlan>), CoreError> {
    if proposal.pre_executed {
        // Already ran during streaming; accept means "keep it". Do not
        // invoke the tool again, just checkpoint what it already produced.
        let summary = format!("{} (auto-executed, accepted)", proposal.tool_name);
        let ops = match &proposal.pre_execution_state {
            Some(pre_state) => vec![checkpoint_op(
                checkpoints,
                ctx,
                ToolOp {
                    op_type: "file_edit".into(),
                    path: Some(pre_state.file_path.clone()),
                    before: pre_state.original_content.clone(),
                    after: current_file_content(ctx, &pre_state.file_path).await?,
                    before_checkpoint_id: None,
                    after_checkpoint_id: None,
                    before_checkpoint_created: false,
                    after_checkpoint_created: false,
                    pre_executed: true,
                },
            )
            .trimmed_for_history()],
            None => Vec::new(),
        };
        let record = ToolExecutionRecord {
            call_id: proposal.call_id.clone(),
            tool_name: proposal.tool_name.clone(),
            params: proposal.params.clone(),
            accepted: true,
            executed_at: chrono::Utc::now(),
            summary,
            result: serde_json::Value::Null,
            ops,
            error: None,
        };
        return Ok((record, None));
    }

    let tool = registry.check_allowed(domain, &proposal.tool_name)?;
    let output = tool.execute(&proposal.params, ctx).await;
    let record = match output {
        Ok(out) => {
            let plan_update = plan_from_result(&proposal.tool_name, &out.result);
            let checkpointed_ops: Vec<ToolOp> = out
                .ops
                .into_iter()
                .map(|op| checkpoint_op(checkpoints, ctx, op))
                .map(ToolOp::trimmed_for_history)
                .collect();
            (
                ToolExecutionRecord {
                    call_id: proposal.call_id.clone(),
                    tool_name: proposal.tool_name.clone(),
                    params: proposal.params.clone(),
                    accepted: true,
                    executed_at: chrono::Utc::now(),
                    summary: out.summary,
                    result: out.result,
                    ops: checkpointed_ops,
                    error: None,
                },
                plan_update,
            )
        }
        Err(e) => (
            ToolExecutionRecord {
                call_id: proposal.call_id.clone(),
                tool_name: proposal.tool_name.clone(),
                params: proposal.params.clone(),
                accepted: true,
                executed_at: chrono::Utc::now(),
                summary: format!("execution failed: {e}"),
                result: serde_json::Value::Null,
                ops: Vec::new(),
                error: Some(e.to_string()),
            },
            None,
        ),
    };
    Ok(record)
}

/// Save before/after checkpoints for one op, keyed by the workspace and the
/// op's own file path (not the task id) so per-file retention and
/// most-recent-hash dedup are scoped to that file. A content-limit failure
/// on either side is swallowed (the op still records, just without that
/// checkpoint id) since an oversized file isn't grounds to fail the whole
/// tool call.
fn checkpoint_op(store: &mut CheckpointStore, ctx: &ToolContext, mut op: ToolOp) -> ToolOp {
    if op.before == op.after {
        return op;
    }
    let workspace = workspace_key(ctx);
    let Some(path) = op.path.clone() else { return op };
    let edit_type = op.op_type.clone();

    if let Some(before) = &op.before {
        if let Ok(created) = store.save(&workspace, &path, before, &edit_type) {
            op.before_checkpoint_created = created.newly_created;
            op.before_checkpoint_id = Some(created.id);
        }
    }
    if let Some(after) = &op.after {
        if let Ok(created) = store.save(&workspace, &path, after, &edit_type) {
            op.after_checkpoint_created = created.newly_created;
            op.after_checkpoint_id = Some(created.id);
        }
    }
    op
}

/// Stable identifier for a workspace, for keying checkpoints. Embedders
/// without an explicit workspace path (e.g. tests) all share the empty key,
/// which is fine since there's only ever one in that case.
fn workspace_key(ctx: &ToolContext) -> String {
    ctx.workspace_path
        .as_deref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Current on-disk content of `relative`, or `None` if it no longer exists
/// (the auto-executed op deleted it, or a later one in the same turn did).
async fn current_file_content(ctx: &ToolContext, relative: &str) -> Result<Option<String>, CoreError> {
    let (abs_path, rel) = ctx.resolve(relative)?;
    match tokio::fs::read_to_string(&abs_path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CoreError::Io { path: rel, source }),
    }
}

async fn reject(proposal: &ToolCallProposal, ctx: &ToolContext) -> Result<ToolExecutionRecord, CoreError> {
    let mut revert_error = None;
    if let Some(pre_state) = &proposal.pre_execution_state {
        if let Err(e) = revert_pre_execution(pre_state, ctx).await {
            revert_error = Some(e.to_string());
        }
    }

    Ok(ToolExecutionRecord {
        call_id: proposal.call_id.clone(),
        tool_name: proposal.tool_name.clone(),
        params: proposal.params.clone(),
        accepted: false,
        executed_at: chrono::Utc::now(),
        summary: if proposal.pre_executed {
            format!("{} (auto-executed, rejected and reverted)", proposal.tool_name)
        } else {
            format!("{} (rejected, not executed)", proposal.tool_name)
        },
        result: serde_json::Value::Null,
        ops: Vec::new(),
        error: revert_error,
    })
}

/// Undo a speculative auto-execution using the edit_mode metadata captured
/// in the proposal's own resolved parameters.
async fn revert_pre_execution(pre_state: &PreExecutionState, ctx: &ToolContext) -> Result<(), CoreError> {
    let (abs_path, rel_path) = ctx.resolve(&pre_state.file_path)?;

    match pre_state.tool_name.as_str() {
        "file.write" => {
            match &pre_state.original_content {
                Some(content) => tokio::fs::write(&abs_path, content).await,
                None => tokio::fs::remove_file(&abs_path).await,
            }
            .map_err(|source| CoreError::Io { path: rel_path, source })?;
            remove_created_dirs(&pre_state.created_dirs).await;
            Ok(())
        }
        "file.edit" => revert_file_edit(pre_state, &abs_path, &rel_path).await,
        _ => Ok(()),
    }
}

/// Remove directories auto-execute created for this file, innermost first,
/// stopping as soon as one is no longer empty — a later op may have put
/// something else there, and its ancestors are then not ours to remove.
async fn remove_created_dirs(created_dirs: &[String]) {
    for dir in created_dirs {
        match tokio::fs::remove_dir(dir).await {
            Ok(()) => continue,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(_) => break,
        }
    }
}

async fn revert_file_edit(
    pre_state: &PreExecutionState,
    abs_path: &std::path::Path,
    rel_path: &str,
) -> Result<(), CoreError> {
    let current = tokio::fs::read_to_string(abs_path)
        .await
        .map_err(|source| CoreError::Io { path: rel_path.to_string(), source })?;
    let op = synthetic_op_for_revert(pre_state, rel_path);
    let params = &pre_state.resolved_params;

    let reverted = match edit_mode(params) {
        Some("find_replace") => {
            let find_text = required_str(params, "find_text")?;
            let replace_text = required_str(params, "replace_text")?;
            let replace_all = param_get(params, "replace_all").and_then(|v| v.as_bool()).unwrap_or(false);
            revert_find_replace_edit(&op, &current, find_text, replace_text, replace_all)?
        }
        Some("line_range") => {
            let start = required_i64(params, "start_line")? as usize;
            let end = required_i64(params, "end_line")? as usize;
            revert_line_range_edit(&op, &current, start, end)?
        }
        _ => {
            return Err(CoreError::ToolExecution {
                message: "cannot revert file.edit: unknown edit_mode".into(),
            })
        }
    };

    tokio::fs::write(abs_path, reverted)
        .await
        .map_err(|source| CoreError::Io { path: rel_path.to_string(), source })
}

fn synthetic_op_for_revert(pre_state: &PreExecutionState, rel_path: &str) -> ToolOp {
    ToolOp {
        op_type: "file_edit".into(),
        path: Some(rel_path.to_string()),
        before: Some(pre_state.original_content.clone().unwrap_or_default()),
        after: None,
        before_checkpoint_id: None,
        after_checkpoint_id: None,
        before_checkpoint_created: false,
        after_checkpoint_created: false,
        pre_executed: true,
    }
}

fn edit_mode(params: &ParamMap) -> Option<&str> {
    param_get(params, "edit_mode").and_then(|v| v.as_str())
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

fn plan_from_result(tool_name: &str, result: &serde_json::Value) -> Option<ExecutionPlan> {
    if tool_name != "plan.write" && tool_name != "plan.update" {
        return None;
    }
    serde_json::from_value(result.get("plan")?.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentkit_config::EngineConfig;
    use agentkit_tools::register_builtins;
    use agentkit_types::{ParamValue, PreExecutionState};
    use std::path::PathBuf;

    fn ctx(dir: &std::path::Path) -> ToolContext {
        ToolContext::new(Some(PathBuf::from(dir)))
    }

    fn task() -> TaskState {
        TaskState::new("t1", "c1", "coder", "a1", "do it", None)
    }

    fn checkpoints() -> CheckpointStore {
        CheckpointStore::new(&EngineConfig::default())
    }

    #[tokio::test]
    async fn non_pre_executed_accept_runs_the_tool() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        registry.set_domain_allowlist("coder", ["file.write"]);

        let mut t = task();
        let params: ParamMap = vec![
            ("file_path".into(), ParamValue::String("a.txt".into())),
            ("content".into(), ParamValue::String("hi".into())),
        ];
        t.pending.push(ToolCallProposal::new("c1", "file.write", params, "because"));

        let outcomes = handle_tool_decisions(
            &mut t,
            &[("c1".to_string(), Decision::Accept)],
            &registry,
            &ctx(dir.path()),
            &mut checkpoints(),
        )
        .await
        .unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].stale);
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "hi");
        assert!(t.pending.is_empty());
        assert_eq!(t.history.len(), 1);
    }

    #[tokio::test]
    async fn non_pre_executed_reject_never_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ToolRegistry::new();
        let mut t = task();
        let params: ParamMap = vec![
            ("file_path".into(), ParamValue::String("a.txt".into())),
            ("content".into(), ParamValue::String("hi".into())),
        ];
        t.pending.push(ToolCallProposal::new("c1", "file.write", params, "because"));

        handle_tool_decisions(&mut t, &[("c1".to_string(), Decision::Reject)], &registry, &ctx(dir.path()), &mut checkpoints())
            .await
            .unwrap();

        assert!(!dir.path().join("a.txt").exists());
        assert!(!t.history[0].accepted);
    }

    #[tokio::test]
    async fn pre_executed_accept_does_not_rerun_the_tool() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "already written by streaming").unwrap();
        let registry = ToolRegistry::new();
        let mut t = task();

        let pre_state = PreExecutionState {
            tool_name: "file.write".into(),
            file_path: "a.txt".into(),
            original_content: None,
            resolved_params: vec![("file_path".into(), ParamValue::String("a.txt".into()))],
            created_dirs: vec![],
        };
        t.pending.push(
            ToolCallProposal::new("c1", "file.write", vec![], "auto").with_pre_execution(pre_state),
        );

        handle_tool_decisions(&mut t, &[("c1".to_string(), Decision::Accept)], &registry, &ctx(dir.path()), &mut checkpoints())
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "already written by streaming"
        );
        assert!(t.history[0].accepted);
        assert_eq!(t.history[0].ops.len(), 1);
        assert!(t.history[0].ops[0].after_checkpoint_id.is_some());
        assert!(t.history[0].ops[0].after.is_none(), "trimmed before storage");
    }

    #[tokio::test]
    async fn pre_executed_reject_reverts_a_new_file_by_deleting_it() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "speculatively written").unwrap();
        let registry = ToolRegistry::new();
        let mut t = task();

        let pre_state = PreExecutionState {
            tool_name: "file.write".into(),
            file_path: "a.txt".into(),
            original_content: None,
            resolved_params: vec![],
            created_dirs: vec![],
        };
        t.pending.push(
            ToolCallProposal::new("c1", "file.write", vec![], "auto").with_pre_execution(pre_state),
        );

        handle_tool_decisions(&mut t, &[("c1".to_string(), Decision::Reject)], &registry, &ctx(dir.path()), &mut checkpoints())
            .await
            .unwrap();

        assert!(!dir.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn pre_executed_reject_removes_directories_it_created_innermost_first() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        std::fs::write(dir.path().join("a/b/c/file.txt"), "speculatively written").unwrap();
        let registry = ToolRegistry::new();
        let mut t = task();

        let pre_state = PreExecutionState {
            tool_name: "file.write".into(),
            file_path: "a/b/c/file.txt".into(),
            original_content: None,
            resolved_params: vec![],
            created_dirs: vec![
                dir.path().join("a/b/c").to_string_lossy().into_owned(),
                dir.path().join("a/b").to_string_lossy().into_owned(),
                dir.path().join("a").to_string_lossy().into_owned(),
            ],
        };
        t.pending.push(
            ToolCallProposal::new("c1", "file.write", vec![], "auto").with_pre_execution(pre_state),
        );

        handle_tool_decisions(&mut t, &[("c1".to_string(), Decision::Reject)], &registry, &ctx(dir.path()), &mut checkpoints())
            .await
            .unwrap();

        assert!(!dir.path().join("a/b/c/file.txt").exists());
        assert!(!dir.path().join("a").exists(), "all three levels should be removed");
    }

    #[tokio::test]
    async fn pre_executed_reject_keeps_a_created_dir_that_is_no_longer_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("a/b/file.txt"), "speculatively written").unwrap();
        std::fs::write(dir.path().join("a/other.txt"), "something unrelated landed here").unwrap();
        let registry = ToolRegistry::new();
        let mut t = task();

        let pre_state = PreExecutionState {
            tool_name: "file.write".into(),
            file_path: "a/b/file.txt".into(),
            original_content: None,
            resolved_params: vec![],
            created_dirs: vec![
                dir.path().join("a/b").to_string_lossy().into_owned(),
                dir.path().join("a").to_string_lossy().into_owned(),
            ],
        };
        t.pending.push(
            ToolCallProposal::new("c1", "file.write", vec![], "auto").with_pre_execution(pre_state),
        );

        handle_tool_decisions(&mut t, &[("c1".to_string(), Decision::Reject)], &registry, &ctx(dir.path()), &mut checkpoints())
            .await
            .unwrap();

        assert!(!dir.path().join("a/b").exists());
        assert!(dir.path().join("a").exists(), "non-empty directory must survive");
        assert!(dir.path().join("a/other.txt").exists());
    }

    #[tokio::test]
    async fn pre_executed_reject_reverts_an_overwrite_to_its_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "speculative new content").unwrap();
        let registry = ToolRegistry::new();
        let mut t = task();

        let pre_state = PreExecutionState {
            tool_name: "file.write".into(),
            file_path: "a.txt".into(),
            original_content: Some("original content".into()),
            resolved_params: vec![],
            created_dirs: vec![],
        };
        t.pending.push(
            ToolCallProposal::new("c1", "file.write", vec![], "auto").with_pre_execution(pre_state),
        );

        handle_tool_decisions(&mut t, &[("c1".to_string(), Decision::Reject)], &registry, &ctx(dir.path()), &mut checkpoints())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "original content");
    }

    #[tokio::test]
    async fn unknown_call_id_is_reported_stale_not_errored() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ToolRegistry::new();
        let mut t = task();
        let outcomes = handle_tool_decisions(
            &mut t,
            &[("ghost".to_string(), Decision::Accept)],
            &registry,
            &ctx(dir.path()),
            &mut checkpoints(),
        )
        .await
        .unwrap();
        assert!(outcomes[0].stale);
    }
}
