//! UPLINK: Reasoning engine boundary
//!
//! Conversation wire types, the `Provider` trait and the ordered event
//! stream a model turn is delivered as.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use thiserror::Error;
use tracing::{debug, trace};

pub mod openrouter;
pub mod sse;

pub use openrouter::OpenRouterProvider;
pub use sse::SseDecoder;

/// Reasoning engine errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("REQUEST FAILED: {0}")]
    Request(#[from] reqwest::Error),

    #[error("DECODE ERROR: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ENGINE REJECTED: {0}")]
    Api(String),

    #[error("ACCESS DENIED: NO API KEY")]
    NoApiKey,

    #[error("CORRUPTED RESPONSE")]
    InvalidResponse,

    #[error("RATE LIMITED")]
    RateLimited,

    #[error("STREAM INTERRUPTED: {0}")]
    StreamInterrupted(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Tool invocation issued by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// A complete (non-streamed) model response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub finish_reason: String,
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            usage: Usage::default(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: Some(message.into()),
            tool_calls: Vec::new(),
            finish_reason: "error".to_string(),
            usage: Usage::default(),
        }
    }

    /// Replay this response as the event sequence a streamed turn would produce
    pub fn into_events(self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if let Some(text) = self.content.filter(|c| !c.is_empty()) {
            events.push(StreamEvent::TextDelta { text });
        }
        for call in self.tool_calls {
            events.push(StreamEvent::ToolInputStart {
                id: call.id.clone(),
                name: call.name.clone(),
            });
            events.push(StreamEvent::ToolInputComplete {
                id: call.id,
                name: call.name,
                input: call.arguments,
            });
        }
        events.push(StreamEvent::MessageComplete {
            finish_reason: self.finish_reason,
            usage: self.usage,
        });
        events
    }
}

/// Token accounting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Conversation history entry as sent to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Assistant turn carrying tool calls, with optional text
    pub fn assistant_with_tools(content: Option<String>, tool_calls: Vec<ToolCallDef>) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            tool_call_id: None,
            name: None,
        }
    }

    pub fn tool(
        call_id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(result.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
            name: Some(name.into()),
        }
    }
}

/// Tool call as recorded in an assistant message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDef {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCallDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Value,
}

/// Tool advertised to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDef,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Request parameters
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<Tool>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub tool_choice: ToolChoice,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            tools: Vec::new(),
            max_tokens: 4096,
            temperature: 0.7,
            tool_choice: ToolChoice::Auto,
        }
    }
}

/// Tool selection mode
#[derive(Debug, Clone)]
pub enum ToolChoice {
    Auto,
    Required(String),
    None,
}

/// One incremental message-construction event.
///
/// A turn is an ordered sequence of these ending with `MessageComplete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    TextDelta {
        text: String,
    },
    ToolInputStart {
        id: String,
        name: String,
    },
    ToolInputDelta {
        id: String,
        delta: String,
    },
    ToolInputComplete {
        id: String,
        name: String,
        input: Value,
    },
    /// Result produced upstream of the core
    ToolResult {
        id: String,
        output: Value,
    },
    MessageComplete {
        finish_reason: String,
        #[serde(default)]
        usage: Usage,
    },
}

impl StreamEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextDelta { .. } => "text-delta",
            Self::ToolInputStart { .. } => "tool-input-start",
            Self::ToolInputDelta { .. } => "tool-input-delta",
            Self::ToolInputComplete { .. } => "tool-input-complete",
            Self::ToolResult { .. } => "tool-result",
            Self::MessageComplete { .. } => "message-complete",
        }
    }
}

/// Ordered, single-consumer stream of turn events
pub type EventStream = mpsc::Receiver<Result<StreamEvent>>;

/// Wrap already-known events in an [`EventStream`]
pub fn event_stream(events: Vec<Result<StreamEvent>>) -> EventStream {
    let (tx, rx) = mpsc::channel(events.len().max(1));
    for event in events {
        if tx.try_send(event).is_err() {
            break;
        }
    }
    rx
}

/// Reasoning engine
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse>;

    /// Stream a turn. The default replays a blocking `chat` call.
    async fn chat_stream(&self, params: ChatParams) -> Result<EventStream> {
        let response = self.chat(params).await?;
        debug!(
            "◆ REPLAYING BLOCKING RESPONSE AS STREAM ({} tool calls)",
            response.tool_calls.len()
        );
        let events = response.into_events();
        trace!("◆ {} EVENTS", events.len());
        Ok(event_stream(events.into_iter().map(Ok).collect()))
    }

    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}
