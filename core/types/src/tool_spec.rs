//! Tool Specification: immutable, schema-driven tool metadata.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Effect tags a tool may carry, used for prompt rendering and policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Net,
    Disk,
    Exec,
    Context,
}

/// A declared value type for a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

/// One named parameter in a tool's input schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
    #[serde(default)]
    pub r#enum: Option<Vec<String>>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

impl ParamSchema {
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            description: description.into(),
            r#enum: None,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            description: description.into(),
            r#enum: None,
            default: None,
        }
    }

    pub fn with_enum(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.r#enum = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Immutable tool metadata registered with the tool registry.
///
/// The executor function itself lives behind the `agentkit-tools::Tool`
/// trait; this struct is the declarative part consumed by the parser (for
/// typing) and the prompt builder (for the catalog).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub version: u32,
    pub description: String,
    pub effects: BTreeSet<Effect>,
    pub input_schema: Vec<ParamSchema>,
    pub output_description: String,
}

impl ToolSpec {
    pub fn param(&self, name: &str) -> Option<&ParamSchema> {
        self.input_schema.iter().find(|p| p.name == name)
    }

    pub fn required_params(&self) -> impl Iterator<Item = &ParamSchema> {
        self.input_schema.iter().filter(|p| p.required)
    }

    pub fn optional_params(&self) -> impl Iterator<Item = &ParamSchema> {
        self.input_schema.iter().filter(|p| !p.required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_and_optional_partition() {
        let spec = ToolSpec {
            name: "file.write".into(),
            version: 1,
            description: "write a file".into(),
            effects: [Effect::Disk].into_iter().collect(),
            input_schema: vec![
                ParamSchema::required("file_path", ParamType::String, "path"),
                ParamSchema::required("content", ParamType::String, "content"),
                ParamSchema::optional("overwrite", ParamType::Boolean, "overwrite existing"),
            ],
            output_description: "status".into(),
        };
        assert_eq!(spec.required_params().count(), 2);
        assert_eq!(spec.optional_params().count(), 1);
        assert!(spec.param("content").is_some());
        assert!(spec.param("missing").is_none());
    }
}
