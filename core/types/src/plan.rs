//! Execution Plan, owned by the `plan.write`/`plan.update` tools.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub step_id: String,
    pub description: String,
    pub status: StepStatus,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionPlan {
    pub task_description: String,
    pub steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    pub fn new(task_description: impl Into<String>, steps: Vec<PlanStep>) -> Self {
        Self {
            task_description: task_description.into(),
            steps,
        }
    }

    /// Enforce the step-id uniqueness invariant; returns the duplicate id
    /// if the plan is invalid.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if !seen.insert(&step.step_id) {
                return Err(step.step_id.clone());
            }
        }
        Ok(())
    }

    pub fn step_mut(&mut self, step_id: &str) -> Option<&mut PlanStep> {
        self.steps.iter_mut().find(|s| s.step_id == step_id)
    }

    /// Compact rendering for the prompt builder: omit completed steps.
    pub fn render_compact(&self) -> String {
        let pending: Vec<&PlanStep> = self
            .steps
            .iter()
            .filter(|s| s.status != StepStatus::Completed)
            .collect();
        if pending.is_empty() {
            return format!("Plan: {} (all steps completed)", self.task_description);
        }
        let lines: Vec<String> = pending
            .iter()
            .map(|s| format!("- [{:?}] {}: {}", s.status, s.step_id, s.description))
            .collect();
        format!("Plan: {}\n{}", self.task_description, lines.join("\n"))
    }
}
