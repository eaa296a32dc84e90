//! Server-sent event decoding for streamed chat completions
//!
//! Turns `data:` lines from an OpenAI-compatible endpoint into
//! [`StreamEvent`]s. Bytes are buffered until a full line arrives, so a
//! multi-byte character split across network chunks decodes intact.
//! Tool-call argument fragments are accumulated per call index and parsed
//! once the engine reports a finish reason.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{trace, warn};
use uuid::Uuid;

use crate::{ProviderError, Result, StreamEvent, Usage};

#[derive(Debug, Default)]
struct PendingCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
    started: bool,
}

impl PendingCall {
    /// Engines that omit call ids get one scoped to this stream, so a later
    /// turn never reuses an id the reconciler has already applied
    fn id_for(&self, stream_id: &str, index: u64) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("call_{}_{}", stream_id, index))
    }
}

/// Incremental SSE decoder. Feed raw body chunks in arrival order, then
/// call [`SseDecoder::finish`] once the body ends.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    stream_id: String,
    calls: BTreeMap<u64, PendingCall>,
    finish_reason: Option<String>,
    usage: Usage,
    flushed: bool,
    done: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            stream_id: Uuid::new_v4().simple().to_string(),
            calls: BTreeMap::new(),
            finish_reason: None,
            usage: Usage::default(),
            flushed: false,
            done: false,
        }
    }

    /// True once `MessageComplete` has been emitted
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Decode a chunk of the response body. Only complete lines are
    /// decoded; the tail waits for the next chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = utf8(&line)?;
            self.decode_line(line.trim(), &mut events);
        }

        Ok(events)
    }

    /// Flush what is left once the body has ended.
    ///
    /// A body that stops before `[DONE]` or a finish reason is an
    /// interrupted stream: pending tool calls are dropped and an error is
    /// returned instead of a `MessageComplete`.
    pub fn finish(&mut self) -> Result<Vec<StreamEvent>> {
        let mut events = Vec::new();
        let rest = std::mem::take(&mut self.buffer);
        let rest = utf8(&rest)?;
        self.decode_line(rest.trim(), &mut events);

        if self.done {
            return Ok(events);
        }
        if self.finish_reason.is_some() {
            self.complete(&mut events);
            return Ok(events);
        }

        warn!(
            "◆ BODY ENDED MID-MESSAGE, DROPPING {} PENDING CALLS",
            self.calls.len()
        );
        self.calls.clear();
        Err(ProviderError::StreamInterrupted(
            "body ended before the message completed".to_string(),
        ))
    }

    fn decode_line(&mut self, line: &str, events: &mut Vec<StreamEvent>) {
        if self.done || line.is_empty() || line.starts_with(':') {
            return;
        }
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.trim();

        if data == "[DONE]" {
            self.complete(events);
            return;
        }

        let chunk: Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                warn!("◆ DROPPING MALFORMED CHUNK: {}", e);
                return;
            }
        };

        if let Some(usage) = chunk["usage"].as_object() {
            let field = |k: &str| usage.get(k).and_then(|v| v.as_u64()).unwrap_or(0) as u32;
            self.usage = Usage {
                prompt_tokens: field("prompt_tokens"),
                completion_tokens: field("completion_tokens"),
                total_tokens: field("total_tokens"),
            };
        }

        let Some(choice) = chunk["choices"].get(0) else {
            return;
        };
        let delta = &choice["delta"];

        if let Some(text) = delta["content"].as_str() {
            if !text.is_empty() {
                events.push(StreamEvent::TextDelta {
                    text: text.to_string(),
                });
            }
        }

        if let Some(calls) = delta["tool_calls"].as_array() {
            for (position, call) in calls.iter().enumerate() {
                let index = call["index"].as_u64().unwrap_or(position as u64);
                self.decode_tool_delta(index, call, events);
            }
        }

        if let Some(reason) = choice["finish_reason"].as_str() {
            trace!("◆ FINISH REASON: {}", reason);
            self.finish_reason = Some(reason.to_string());
            self.flush_calls(events);
        }
    }

    fn decode_tool_delta(&mut self, index: u64, call: &Value, events: &mut Vec<StreamEvent>) {
        let stream_id = &self.stream_id;
        let pending = self.calls.entry(index).or_default();

        if let Some(id) = call["id"].as_str().filter(|s| !s.is_empty()) {
            pending.id.get_or_insert_with(|| id.to_string());
        }
        if let Some(name) = call["function"]["name"].as_str().filter(|s| !s.is_empty()) {
            pending.name.get_or_insert_with(|| name.to_string());
        }

        if !pending.started {
            if let Some(name) = pending.name.clone() {
                pending.started = true;
                events.push(StreamEvent::ToolInputStart {
                    id: pending.id_for(stream_id, index),
                    name,
                });
            }
        }

        if let Some(fragment) = call["function"]["arguments"].as_str() {
            if !fragment.is_empty() {
                pending.arguments.push_str(fragment);
                if pending.started {
                    events.push(StreamEvent::ToolInputDelta {
                        id: pending.id_for(stream_id, index),
                        delta: fragment.to_string(),
                    });
                }
            }
        }
    }

    fn flush_calls(&mut self, events: &mut Vec<StreamEvent>) {
        if self.flushed {
            return;
        }
        self.flushed = true;

        for (index, pending) in std::mem::take(&mut self.calls) {
            let id = pending.id_for(&self.stream_id, index);
            let name = pending.name.clone().unwrap_or_default();
            if !pending.started {
                events.push(StreamEvent::ToolInputStart {
                    id: id.clone(),
                    name: name.clone(),
                });
            }

            let input = if pending.arguments.trim().is_empty() {
                Value::Object(Default::default())
            } else {
                match serde_json::from_str(&pending.arguments) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!("◆ UNPARSEABLE TOOL INPUT FOR {} ({}): {}", name, id, e);
                        Value::String(pending.arguments)
                    }
                }
            };

            events.push(StreamEvent::ToolInputComplete { id, name, input });
        }
    }

    fn complete(&mut self, events: &mut Vec<StreamEvent>) {
        if self.done {
            return;
        }
        self.flush_calls(events);
        self.done = true;
        events.push(StreamEvent::MessageComplete {
            finish_reason: self
                .finish_reason
                .clone()
                .unwrap_or_else(|| "stop".to_string()),
            usage: self.usage.clone(),
        });
    }
}

fn utf8(line: &[u8]) -> Result<&str> {
    std::str::from_utf8(line).map_err(|e| {
        ProviderError::StreamInterrupted(format!("invalid UTF-8 in stream: {}", e))
    })
}
