//! Extracts `<MESSAGE>`, `<TOOL_CALL>`, `<AGENT_STATUS>`, `<CODE_SPEC>`
//! from a complete model response.

use once_cell::sync::Lazy;
use regex::Regex;

use agentkit_types::{ParamMap, ParamValue, SchemaLookup};

use crate::coerce::coerce;

static MESSAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<MESSAGE>(.*?)</MESSAGE>").unwrap());
static TOOL_CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<TOOL_CALL>(.*?)</TOOL_CALL>").unwrap());
static AGENT_STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<AGENT_STATUS>(.*?)</AGENT_STATUS>").unwrap());
static CODE_SPEC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<CODE_SPEC>(.*?)</CODE_SPEC>").unwrap());
static TOOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<TOOL>(.*?)</TOOL>").unwrap());
static REASON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<REASON>(.*?)</REASON>").unwrap());
static PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?is)<PARAM\s+name\s*=\s*"([^"]*)"\s*>(.*?)</PARAM>"#).unwrap());
static FIRST_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[A-Za-z_][^>]*>").unwrap());

/// The inferred or explicit agent status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStatus {
    AwaitTool,
    Complete,
    /// An explicit but unrecognized status tag; the driver logs a warning
    /// and treats it as `Complete`.
    Other(String),
}

#[derive(Debug, Clone)]
pub struct ParsedToolCall {
    pub tool_name: String,
    pub reason: String,
    pub params: ParamMap,
    /// Non-fatal schema coercion failures (param name + message); the raw
    /// string value is still present in `params` so downstream stages can
    /// surface the problem to the model.
    pub coercion_warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub message: String,
    /// `None` only when no `<AGENT_STATUS>` was present AND no tool calls
    /// were extracted (the parse-error case).
    pub status: Option<AgentStatus>,
    pub tool_calls: Vec<ParsedToolCall>,
    pub code_spec: Option<String>,
    pub raw: String,
}

impl ParsedResponse {
    /// True when the response had neither a usable status nor any tool
    /// calls.
    pub fn is_parse_error(&self) -> bool {
        self.status.is_none()
    }

    /// True for the "AWAIT_TOOL with zero tool calls" case: an explicit
    /// status claims tools are coming but none were extracted, typically a
    /// closing-tag typo.
    pub fn is_malformed_tool_call(&self) -> bool {
        matches!(self.status, Some(AgentStatus::AwaitTool)) && self.tool_calls.is_empty()
    }
}

/// Parse a complete model response.
///
/// `lookup` supplies the declared parameter type for schema-driven
/// coercion; when `None` (or a tool/param is unknown to it), values
/// default to verbatim strings.
pub fn parse(text: &str, lookup: Option<&dyn SchemaLookup>) -> ParsedResponse {
    let message = extract_message(text);
    let tool_calls = TOOL_CALL_RE
        .captures_iter(text)
        .map(|c| parse_tool_call(&c[1], lookup))
        .collect::<Vec<_>>();
    let code_spec = CODE_SPEC_RE.captures(text).map(|c| c[1].trim().to_string());

    let explicit_status = AGENT_STATUS_RE.captures(text).map(|c| c[1].trim().to_uppercase());
    let status = match explicit_status.as_deref() {
        Some("AWAIT_TOOL") => Some(AgentStatus::AwaitTool),
        Some("COMPLETE") => Some(AgentStatus::Complete),
        Some(other) => Some(AgentStatus::Other(other.to_string())),
        None if !tool_calls.is_empty() => Some(AgentStatus::AwaitTool),
        None => None,
    };

    ParsedResponse {
        message,
        status,
        tool_calls,
        code_spec,
        raw: text.to_string(),
    }
}

fn extract_message(text: &str) -> String {
    if let Some(c) = MESSAGE_RE.captures(text) {
        return c[1].trim().to_string();
    }
    match FIRST_TAG_RE.find(text) {
        Some(m) => text[..m.start()].trim().to_string(),
        None => text.trim().to_string(),
    }
}

fn parse_tool_call(block: &str, lookup: Option<&dyn SchemaLookup>) -> ParsedToolCall {
    let tool_name = TOOL_RE
        .captures(block)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    let reason = REASON_RE
        .captures(block)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();

    let mut params: ParamMap = Vec::new();
    let mut coercion_warnings = Vec::new();
    for cap in PARAM_RE.captures_iter(block) {
        let name = cap[1].to_string();
        let raw_value = &cap[2];
        let value = match lookup.and_then(|l| l.param_schema(&tool_name, &name)) {
            Some(schema) => match coerce(raw_value, &schema) {
                Ok(v) => v,
                Err(e) => {
                    coercion_warnings.push(format!("{name}: {e}"));
                    ParamValue::String(raw_value.to_string())
                }
            },
            // Unknown tool/param: preserve literally, the string case's
            // default behavior and the safest default for unknowns.
            None => ParamValue::String(raw_value.to_string()),
        };
        params.push((name, value));
    }

    ParsedToolCall {
        tool_name,
        reason,
        params,
        coercion_warnings,
    }
}
