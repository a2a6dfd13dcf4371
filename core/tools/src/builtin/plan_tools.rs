//! `plan.write` / `plan.update`: the task's [`ExecutionPlan`] is
//! threaded through `ToolContext.current_plan`; these tools never mutate it
//! in place (the context is borrowed immutably) — they return the new plan
//! as `result.plan` and the iteration driver re-points `TaskState.plan` at it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;

use agentkit_error::CoreError;
use agentkit_types::{
    param_get, Effect, ExecutionPlan, ParamMap, ParamSchema, ParamType, ParamValue, PlanStep,
    StepStatus, ToolSpec,
};

use crate::context::ToolContext;
use crate::tool::{Tool, ToolOutput};

static WRITE_SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "plan.write".into(),
    version: 1,
    description: "Replace the task's plan with a new list of steps.".into(),
    effects: [Effect::Context].into_iter().collect(),
    input_schema: vec![
        ParamSchema::required("task_description", ParamType::String, "one-line summary of the overall task"),
        ParamSchema::required("steps", ParamType::Array, "ordered list of { step_id, description } objects"),
    ],
    output_description: "the newly written plan".into(),
});

static UPDATE_SPEC: Lazy<ToolSpec> = Lazy::new(|| ToolSpec {
    name: "plan.update".into(),
    version: 1,
    description: "Update the status (and optionally result) of one existing plan step.".into(),
    effects: [Effect::Context].into_iter().collect(),
    input_schema: vec![
        ParamSchema::required("step_id", ParamType::String, "id of the step to update"),
        ParamSchema::required("status", ParamType::String, "new status")
            .with_enum(["pending", "in_progress", "completed", "failed", "skipped"]),
        ParamSchema::optional("result", ParamType::String, "free-form note about the step's outcome"),
    ],
    output_description: "the updated plan".into(),
});

fn step_from_value(v: &ParamValue) -> Result<PlanStep, CoreError> {
    let obj = v.as_object().ok_or_else(|| CoreError::TypeError {
        param: "steps".into(),
        expected: "object".into(),
        message: "each step must be an object with step_id and description".into(),
    })?;
    let step_id = obj
        .get("step_id")
        .and_then(ParamValue::as_str)
        .ok_or_else(|| CoreError::TypeError {
            param: "steps[].step_id".into(),
            expected: "string".into(),
            message: "missing step_id".into(),
        })?
        .to_string();
    let description = obj
        .get("description")
        .and_then(ParamValue::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(PlanStep {
        step_id,
        description,
        status: StepStatus::Pending,
        result: None,
        metadata: BTreeMap::new(),
    })
}

fn parse_status(raw: &str) -> Result<StepStatus, CoreError> {
    match raw {
        "pending" => Ok(StepStatus::Pending),
        "in_progress" => Ok(StepStatus::InProgress),
        "completed" => Ok(StepStatus::Completed),
        "failed" => Ok(StepStatus::Failed),
        "skipped" => Ok(StepStatus::Skipped),
        other => Err(CoreError::TypeError {
            param: "status".into(),
            expected: "pending | in_progress | completed | failed | skipped".into(),
            message: format!("unrecognized status '{other}'"),
        }),
    }
}

#[derive(Default)]
pub struct PlanWriteTool;

#[async_trait]
impl Tool for PlanWriteTool {
    fn spec(&self) -> &ToolSpec {
        &WRITE_SPEC
    }

    async fn execute(&self, params: &ParamMap, _ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let task_description = param_get(params, "task_description")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::TypeError {
                param: "task_description".into(),
                expected: "string".into(),
                message: "missing required parameter".into(),
            })?;
        let steps_value = param_get(params, "steps").ok_or_else(|| CoreError::TypeError {
            param: "steps".into(),
            expected: "array".into(),
            message: "missing required parameter".into(),
        })?;
        let steps: Vec<PlanStep> = match steps_value.as_array() {
            Some(items) => items.iter().map(step_from_value).collect::<Result<_, _>>()?,
            None => vec![step_from_value(steps_value)?],
        };
        let plan = ExecutionPlan::new(task_description, steps);
        plan.validate().map_err(|dup| CoreError::ToolExecution {
            message: format!("duplicate step_id '{dup}' in plan"),
        })?;

        Ok(ToolOutput {
            summary: format!("wrote plan with {} step(s)", plan.steps.len()),
            result: serde_json::json!({ "plan": plan }),
            ops: Vec::new(),
        })
    }
}

#[derive(Default)]
pub struct PlanUpdateTool;

#[async_trait]
impl Tool for PlanUpdateTool {
    fn spec(&self) -> &ToolSpec {
        &UPDATE_SPEC
    }

    async fn execute(&self, params: &ParamMap, ctx: &ToolContext) -> Result<ToolOutput, CoreError> {
        let step_id = param_get(params, "step_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::TypeError {
                param: "step_id".into(),
                expected: "string".into(),
                message: "missing required parameter".into(),
            })?;
        let status_raw = param_get(params, "status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::TypeError {
                param: "status".into(),
                expected: "string".into(),
                message: "missing required parameter".into(),
            })?;
        let status = parse_status(status_raw)?;
        let result_note = param_get(params, "result").and_then(|v| v.as_str()).map(str::to_string);

        let mut plan = ctx
            .current_plan
            .clone()
            .ok_or_else(|| CoreError::ToolExecution {
                message: "no plan exists yet; call plan.write first".into(),
            })?;
        let step = plan.step_mut(step_id).ok_or_else(|| CoreError::ToolExecution {
            message: format!("no such plan step: '{step_id}'"),
        })?;
        step.status = status;
        if result_note.is_some() {
            step.result = result_note;
        }

        Ok(ToolOutput {
            summary: format!("step '{step_id}' -> {status_raw}"),
            result: serde_json::json!({ "plan": plan }),
            ops: Vec::new(),
        })
    }
}
