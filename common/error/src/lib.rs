//! Shared error taxonomy for the agent execution engine.
//!
//! Tool-local and protocol errors never unwind across component boundaries;
//! they are converted to data (a history record or a corrective iteration)
//! by the caller. `CoreError` exists for the handful of failures that *do*
//! need a typed `Result` at a call boundary — registry lookups, schema
//! coercion, and workspace sandboxing.

use snafu::Snafu;

/// Errors raised by the tool registry and schema-driven coercion.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CoreError {
    #[snafu(display("unknown tool: {name}"))]
    UnknownTool { name: String },

    #[snafu(display("tool '{name}' is not allowed in domain '{domain}'"))]
    DisallowedTool { name: String, domain: String },

    #[snafu(display("parameter '{param}' expected type {expected}: {message}"))]
    TypeError {
        param: String,
        expected: String,
        message: String,
    },

    #[snafu(display("path '{path}' escapes workspace root"))]
    WorkspaceEscape { path: String },

    #[snafu(display("file '{path}' is not valid UTF-8"))]
    BinaryFile { path: String },

    #[snafu(display("content for '{path}' is {size} bytes, over the {limit} byte ceiling"))]
    ContentTooLarge {
        path: String,
        size: usize,
        limit: usize,
    },

    #[snafu(display("io error on '{path}': {source}"))]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("tool execution failed: {message}"))]
    ToolExecution { message: String },
}

impl CoreError {
    /// Whether this failure is the kind the model can plausibly self-correct
    /// from if shown the message (vs. a registry/system-level violation).
    pub fn is_recoverable_by_model(&self) -> bool {
        matches!(
            self,
            CoreError::TypeError { .. }
                | CoreError::WorkspaceEscape { .. }
                | CoreError::BinaryFile { .. }
                | CoreError::ContentTooLarge { .. }
                | CoreError::ToolExecution { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Classifies a failure for logging/UI purposes. Distinct from `CoreError`
/// because several of these are never materialized as a `Result::Err` —
/// they are recorded directly as history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FormatError,
    ParseError,
    CompletionRejected,
    UnknownTool,
    DisallowedTool,
    ToolExecutionError,
    RetryableProviderError,
    FatalProviderError,
    PreExecutionSynthesisError,
    RevertError,
    SystemError,
}

impl ErrorKind {
    /// Stable prefix embedded in synthetic call-ids so that garbage
    /// collection can recognize and age out these records.
    pub fn call_id_prefix(self) -> &'static str {
        match self {
            ErrorKind::FormatError => "format_error",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::CompletionRejected => "completion_rejected",
            ErrorKind::UnknownTool => "unknown_tool",
            ErrorKind::DisallowedTool => "disallowed_tool",
            ErrorKind::ToolExecutionError => "tool_execution_error",
            ErrorKind::RetryableProviderError => "retryable_provider_error",
            ErrorKind::FatalProviderError => "fatal_provider_error",
            ErrorKind::PreExecutionSynthesisError => "preexec_synthesis_error",
            ErrorKind::RevertError => "revert_error",
            ErrorKind::SystemError => "system_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_id_prefixes_are_stable() {
        assert_eq!(ErrorKind::FormatError.call_id_prefix(), "format_error");
        assert_eq!(ErrorKind::ParseError.call_id_prefix(), "parse_error");
    }

    #[test]
    fn recoverable_classification() {
        let e = CoreError::TypeError {
            param: "x".into(),
            expected: "integer".into(),
            message: "not a number".into(),
        };
        assert!(e.is_recoverable_by_model());

        let e = CoreError::UnknownTool { name: "x".into() };
        assert!(!e.is_recoverable_by_model());
    }
}
