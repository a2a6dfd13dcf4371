//! Response Parser: extracts tagged model output into tool proposals and
//! status transitions, tolerant of malformed input.

mod coerce;
mod nested_tag;
mod response;

pub use coerce::coerce;
pub use response::{parse, AgentStatus, ParsedResponse, ParsedToolCall};
