//! Turns a growing response buffer into incremental UI events as the model
//! streams, by re-parsing the accumulated text and diffing against what's
//! already been emitted. Re-parsing the whole buffer on every chunk is the
//! simplest correct strategy — the response parser is cheap relative to a
//! model token — and it guarantees the streaming and final-response views
//! can never disagree, since they're the same parser.

use agentkit_types::SchemaLookup;

use crate::callid::synthesize_call_id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSegment {
    Message,
    ToolCall { call_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamAction {
    Append,
    Field,
    Param,
    Complete,
}

#[derive(Debug, Clone)]
pub struct StreamEvent {
    pub segment: StreamSegment,
    pub action: StreamAction,
    pub payload: serde_json::Value,
}

pub struct StreamCoupler {
    buffer: String,
    iteration: u64,
    emitted_message_chars: usize,
    emitted_tool_calls: usize,
}

impl StreamCoupler {
    pub fn new(iteration: u64) -> Self {
        Self {
            buffer: String::new(),
            iteration,
            emitted_message_chars: 0,
            emitted_tool_calls: 0,
        }
    }

    /// Feed the next chunk of model output, returning any new events it
    /// produced. Tool calls are only reported once their closing
    /// `</TOOL_CALL>` tag has arrived, so each one is reported exactly once,
    /// fully formed: no partial tool-call events.
    pub fn push(&mut self, chunk: &str, lookup: Option<&dyn SchemaLookup>) -> Vec<StreamEvent> {
        self.buffer.push_str(chunk);
        let parsed = agentkit_parser::parse(&self.buffer, lookup);
        let mut events = Vec::new();

        let message_chars = parsed.message.chars().count();
        if message_chars > self.emitted_message_chars {
            let delta: String = parsed.message.chars().skip(self.emitted_message_chars).collect();
            self.emitted_message_chars = message_chars;
            events.push(StreamEvent {
                segment: StreamSegment::Message,
                action: StreamAction::Append,
                payload: serde_json::json!({ "text": delta }),
            });
        }

        while self.emitted_tool_calls < parsed.tool_calls.len() {
            let call = &parsed.tool_calls[self.emitted_tool_calls];
            let call_id = synthesize_call_id(self.iteration, self.emitted_tool_calls as u64);
            events.push(StreamEvent {
                segment: StreamSegment::ToolCall { call_id: call_id.clone() },
                action: StreamAction::Complete,
                payload: serde_json::json!({
                    "call_id": call_id,
                    "tool_name": call.tool_name,
                    "reason": call.reason,
                    "params": call.params.iter().map(|(k, v)| (k.clone(), v.to_json())).collect::<serde_json::Map<_, _>>(),
                }),
            });
            self.emitted_tool_calls += 1;
        }

        events
    }

    /// Finalize and return the full parse, for the driver to act on — it
    /// consumes the whole `ParsedResponse`, not just the stream events.
    pub fn finish(&self, lookup: Option<&dyn SchemaLookup>) -> agentkit_parser::ParsedResponse {
        agentkit_parser::parse(&self.buffer, lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_text_streams_incrementally() {
        let mut coupler = StreamCoupler::new(1);
        let e1 = coupler.push("<MESSAGE>Hel", None);
        assert_eq!(e1.len(), 1);
        assert_eq!(e1[0].payload["text"], "Hel");

        let e2 = coupler.push("lo there</MESSAGE>", None);
        assert_eq!(e2[0].payload["text"], "lo there");
    }

    #[test]
    fn tool_call_is_reported_once_fully_closed() {
        let mut coupler = StreamCoupler::new(2);
        let mid = coupler.push("<TOOL_CALL><TOOL>file.read</TOOL><REASON>inspect</REASON>", None);
        assert!(mid.is_empty(), "no event until the closing tag arrives");

        let done = coupler.push("</TOOL_CALL>", None);
        assert_eq!(done.len(), 1);
        match &done[0].segment {
            StreamSegment::ToolCall { call_id } => assert_eq!(call_id, "auto_exec_iter2_tool0"),
            _ => panic!("expected a tool call event"),
        }
        assert_eq!(done[0].action, StreamAction::Complete);
    }

    #[test]
    fn multiple_tool_calls_each_get_their_own_index() {
        let mut coupler = StreamCoupler::new(0);
        let events = coupler.push(
            "<TOOL_CALL><TOOL>a</TOOL><REASON>r</REASON></TOOL_CALL><TOOL_CALL><TOOL>b</TOOL><REASON>r</REASON></TOOL_CALL>",
            None,
        );
        assert_eq!(events.len(), 2);
        match (&events[0].segment, &events[1].segment) {
            (StreamSegment::ToolCall { call_id: a }, StreamSegment::ToolCall { call_id: b }) => {
                assert_eq!(a, "auto_exec_iter0_tool0");
                assert_eq!(b, "auto_exec_iter0_tool1");
            }
            _ => panic!("expected two tool call events"),
        }
    }

    #[test]
    fn finish_returns_the_full_parsed_response() {
        let mut coupler = StreamCoupler::new(0);
        coupler.push("<MESSAGE>hi</MESSAGE><AGENT_STATUS>COMPLETE</AGENT_STATUS>", None);
        let parsed = coupler.finish(None);
        assert_eq!(parsed.message, "hi");
    }
}
