//! Deterministic call-id synthesis for auto-executed tool calls.

/// `auto_exec_iter<N>_tool<K>`: stable within a task, so a reconnecting
/// client can match UI events against history without a round-trip id.
pub fn synthesize_call_id(iteration: u64, tool_index: u64) -> String {
    format!("auto_exec_iter{iteration}_tool{tool_index}")
}
