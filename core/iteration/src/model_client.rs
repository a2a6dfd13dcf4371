//! The model-provider boundary: a single streaming call plus a callback
//! for incremental chunks, mirroring the single-callback shape of
//! `EventSink` rather than an async `Stream` (keeps this crate's
//! dependency footprint aligned with the rest of the workspace).

use async_trait::async_trait;

use agentkit_error::CoreError;

/// One piece of a model's streamed response.
#[derive(Debug, Clone)]
pub enum ModelChunk {
    /// Chain-of-thought / reasoning text, shown to the session logger but
    /// never parsed as part of the tagged response protocol.
    Reasoning(String),
    /// A delta of the actual answer text, to be parsed for
    /// `<MESSAGE>`/`<TOOL_CALL>`/`<AGENT_STATUS>` once the call completes.
    Answer(String),
}

/// A model provider. `call` returns the full concatenated answer text;
/// `on_chunk` is invoked synchronously as chunks arrive so the driver can
/// mirror them to the UI and the auto-execute engine while the call is
/// still in flight.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn call(&self, prompt: &str, on_chunk: &mut dyn FnMut(ModelChunk)) -> Result<String, CoreError>;
}
