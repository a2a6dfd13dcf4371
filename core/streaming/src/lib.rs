//! Streaming parser coupler: turns a growing model-response buffer into
//! incremental UI events and drives auto-execution on completed tool calls.

mod callid;
mod coupler;

pub use callid::synthesize_call_id;
pub use coupler::{StreamAction, StreamCoupler, StreamEvent, StreamSegment};
