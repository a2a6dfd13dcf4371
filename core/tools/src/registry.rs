//! Tool Registry: name → tool spec, idempotent registration, no dynamic
//! unregistration.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use agentkit_error::CoreError;
use agentkit_types::{ParamSchema, SchemaLookup};
use tracing::warn;

use crate::tool::Tool;

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// domain id -> allowed tool names. An absent domain allows every
    /// registered tool (used by tests / simple embedders).
    domain_allowlists: HashMap<String, HashSet<String>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register idempotently: a second registration under the same name
    /// overwrites the first with a warning.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "tool re-registered, overwriting previous spec");
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>, CoreError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownTool { name: name.to_string() })
    }

    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.values().cloned().collect()
    }

    /// Set the allowlist for a domain (e.g. `"coder"`). Tools not named
    /// here are rejected for that domain even if registered
    /// (`CoreError::DisallowedTool`).
    pub fn set_domain_allowlist(&mut self, domain: impl Into<String>, tools: impl IntoIterator<Item = impl Into<String>>) {
        self.domain_allowlists
            .insert(domain.into(), tools.into_iter().map(Into::into).collect());
    }

    /// Validate a proposed tool call against both the registry and the
    /// domain's allowlist: the tool must exist in the registry and be
    /// named in the active domain's allowlist.
    pub fn check_allowed(&self, domain: &str, tool_name: &str) -> Result<Arc<dyn Tool>, CoreError> {
        let tool = self.get(tool_name)?;
        if let Some(allowed) = self.domain_allowlists.get(domain) {
            if !allowed.contains(tool_name) {
                return Err(CoreError::DisallowedTool {
                    name: tool_name.to_string(),
                    domain: domain.to_string(),
                });
            }
        }
        Ok(tool)
    }
}

impl SchemaLookup for ToolRegistry {
    fn param_schema(&self, tool_name: &str, param_name: &str) -> Option<ParamSchema> {
        self.tools.get(tool_name)?.spec().param(param_name).cloned()
    }
}
