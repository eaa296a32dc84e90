//! Conversation reconciler
//!
//! Consumes engine events in order, tracks each tool invocation through its
//! lifecycle and drives the task store. Server tools are applied exactly once
//! per invocation id; client tools wait for [`Reconciler::submit`].

use std::collections::HashSet;

use monitask_provider::{Message, StreamEvent, ToolCallDef, Usage};
use monitask_task::{GateStatus, TaskStore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chooser::{SelectionError, Selection};
use crate::lifecycle::{ToolInvocation, ToolState, ToolView};
use crate::tools::{OptionsPrompt, ToolClass, ToolInput, ToolRegistry};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("◆ UNKNOWN INVOCATION: {0}")]
    UnknownInvocation(String),

    #[error("◆ INVOCATION {id} IS NOT AWAITING INPUT ({state})")]
    NotAwaiting { id: String, state: &'static str },

    #[error("◆ INVOCATION {0} IS SERVER-RESOLVED")]
    NotClientResolved(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Tool(ToolInvocation),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub parts: Vec<Part>,
}

impl ChatMessage {
    fn new(role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            parts: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                Part::Tool(_) => None,
            })
            .collect()
    }

    pub fn tools(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.parts.iter().filter_map(|p| match p {
            Part::Tool(t) => Some(t),
            Part::Text { .. } => None,
        })
    }
}

/// A change the rendering layer may want to draw
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Text(String),
    Tool {
        id: String,
        name: String,
        state: ToolState,
        view: ToolView,
    },
    TurnComplete {
        finish_reason: String,
    },
}

impl Update {
    fn tool(invocation: &ToolInvocation) -> Self {
        Update::Tool {
            id: invocation.id.clone(),
            name: invocation.name.clone(),
            state: invocation.state,
            view: invocation.view(),
        }
    }
}

/// A client prompt waiting on the human
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPrompt {
    pub id: String,
    pub prompt: OptionsPrompt,
}

pub struct Reconciler {
    store: TaskStore,
    registry: ToolRegistry,
    messages: Vec<ChatMessage>,
    applied: HashSet<String>,
    /// Index of the assistant message currently streaming
    open: Option<usize>,
    failure: Option<String>,
    usage: Usage,
}

impl Reconciler {
    pub fn new(store: TaskStore, registry: ToolRegistry) -> Self {
        Self {
            store,
            registry,
            messages: Vec::new(),
            applied: HashSet::new(),
            open: None,
            failure: None,
            usage: Usage::default(),
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// For user-side edits from the rendering layer
    pub fn store_mut(&mut self) -> &mut TaskStore {
        &mut self.store
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn gate(&self) -> GateStatus {
        self.store.gate()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Error from the last failed turn, cleared when a new turn starts
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    pub fn is_streaming(&self) -> bool {
        self.open.is_some()
    }

    pub fn push_user_text(&mut self, text: impl Into<String>) -> String {
        self.open = None;
        self.failure = None;
        let mut message = ChatMessage::new(Role::User);
        message.parts.push(Part::Text { text: text.into() });
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    pub fn invocation(&self, id: &str) -> Option<&ToolInvocation> {
        self.messages
            .iter()
            .flat_map(|m| m.tools())
            .find(|t| t.id == id)
    }

    fn invocation_mut(&mut self, id: &str) -> Option<&mut ToolInvocation> {
        self.messages
            .iter_mut()
            .flat_map(|m| m.parts.iter_mut())
            .find_map(|p| match p {
                Part::Tool(t) if t.id == id => Some(t),
                _ => None,
            })
    }

    fn open_message(&mut self) -> &mut ChatMessage {
        let index = match self.open {
            Some(index) => index,
            None => {
                self.failure = None;
                self.messages.push(ChatMessage::new(Role::Assistant));
                let index = self.messages.len() - 1;
                self.open = Some(index);
                index
            }
        };
        &mut self.messages[index]
    }

    /// Fold one engine event into the conversation
    pub fn handle_event(&mut self, event: StreamEvent) -> Option<Update> {
        match event {
            StreamEvent::TextDelta { text } => {
                let message = self.open_message();
                match message.parts.last_mut() {
                    Some(Part::Text { text: existing }) => existing.push_str(&text),
                    _ => message.parts.push(Part::Text { text: text.clone() }),
                }
                Some(Update::Text(text))
            }
            StreamEvent::ToolInputStart { id, name } => {
                if self.invocation(&id).is_some() {
                    debug!("◆ REPLAYED START FOR {} IGNORED", id);
                    return None;
                }
                debug!("◆ TOOL STREAMING: {} ({})", name, id);
                let invocation = ToolInvocation::new(id, name);
                let update = Update::tool(&invocation);
                self.open_message().parts.push(Part::Tool(invocation));
                Some(update)
            }
            StreamEvent::ToolInputDelta { id, delta } => {
                let invocation = self.invocation_mut(&id)?;
                if invocation.state != ToolState::Streaming {
                    return None;
                }
                invocation.partial_input.push_str(&delta);
                None
            }
            StreamEvent::ToolInputComplete { id, name, input } => {
                self.complete_input(id, name, input)
            }
            StreamEvent::ToolResult { id, output } => self.attach_result(&id, output),
            StreamEvent::MessageComplete {
                finish_reason,
                usage,
            } => {
                // A turn with no content still produces an (empty) assistant message
                self.open_message();
                self.open = None;
                self.usage = usage;
                debug!("◆ MESSAGE COMPLETE: {}", finish_reason);
                Some(Update::TurnComplete { finish_reason })
            }
        }
    }

    fn complete_input(&mut self, id: String, name: String, input: Value) -> Option<Update> {
        if self.invocation(&id).is_none() {
            self.open_message()
                .parts
                .push(Part::Tool(ToolInvocation::new(id.clone(), name.clone())));
        }

        let name = {
            let invocation = self.invocation_mut(&id)?;
            if !invocation.complete_input(input.clone()) {
                debug!("◆ REPLAYED INPUT FOR {} IGNORED", id);
                return None;
            }
            invocation.name.clone()
        };

        match self.registry.validate(&name, &input) {
            Err(e) => {
                warn!("◆ TOOL REJECTED: {} ({}): {}", name, id, e);
                let output = json!({"success": false, "error": e.to_string()});
                self.applied.insert(id.clone());
                self.resolve(&id, output)
            }
            Ok(validated) if validated.kind().class() == ToolClass::Client => {
                info!("◆ AWAITING HUMAN INPUT: {}", id);
                self.invocation(&id).map(Update::tool)
            }
            Ok(validated) => {
                if !self.applied.insert(id.clone()) {
                    debug!("◆ {} ALREADY APPLIED", id);
                    return None;
                }
                let output = self.apply(validated);
                info!("◆ APPLIED {} ({})", name, id);
                self.resolve(&id, output)
            }
        }
    }

    fn attach_result(&mut self, id: &str, output: Value) -> Option<Update> {
        let Some(invocation) = self.invocation_mut(id) else {
            warn!("◆ RESULT FOR UNKNOWN INVOCATION {}", id);
            return None;
        };
        if invocation.state != ToolState::InputComplete {
            debug!(
                "◆ RESULT FOR {} IN STATE {} IGNORED",
                id,
                invocation.state.as_str()
            );
            return None;
        }
        self.applied.insert(id.to_string());
        self.resolve(id, output)
    }

    fn resolve(&mut self, id: &str, output: Value) -> Option<Update> {
        let invocation = self.invocation_mut(id)?;
        if !invocation.resolve(output) {
            return None;
        }
        Some(Update::tool(invocation))
    }

    fn apply(&mut self, input: ToolInput) -> Value {
        match input {
            ToolInput::UpdateScope(update) => {
                self.store.update_scope(&update);
                json!({"success": true, "updates": update})
            }
            ToolInput::AddSources { bundle, drafts } => {
                let ids = self.store.add_sources(&drafts);
                let mut output = json!({"success": true, "added": ids.len(), "sourceIds": ids});
                if let Some(bundle) = bundle {
                    output["bundle"] = json!(bundle);
                }
                output
            }
            ToolInput::FinalizeTask(logic) => {
                let summary = logic.summary.clone();
                self.store.finalize(logic);
                json!({"success": true, "summary": summary, "finalized": true})
            }
            // Client tools never reach the store
            ToolInput::PresentOptions(_) => json!({"success": false, "error": "not a server tool"}),
        }
    }

    /// Client prompts still waiting on the human, oldest first
    pub fn pending_prompts(&self) -> Vec<PendingPrompt> {
        self.messages
            .iter()
            .flat_map(|m| m.tools())
            .filter(|t| t.state == ToolState::InputComplete)
            .filter_map(|t| match t.view() {
                ToolView::Chooser { prompt } => Some(PendingPrompt {
                    id: t.id.clone(),
                    prompt,
                }),
                _ => None,
            })
            .collect()
    }

    /// Answer a client prompt. Returns the tool result now in the conversation.
    pub fn submit(&mut self, id: &str, selection: Selection) -> Result<Value> {
        let invocation = self
            .invocation(id)
            .ok_or_else(|| ReconcileError::UnknownInvocation(id.to_string()))?;

        if invocation.kind().map(|k| k.class()) != Some(ToolClass::Client) {
            return Err(ReconcileError::NotClientResolved(id.to_string()));
        }
        if invocation.state != ToolState::InputComplete {
            return Err(ReconcileError::NotAwaiting {
                id: id.to_string(),
                state: invocation.state.as_str(),
            });
        }

        let ToolView::Chooser { prompt } = invocation.view() else {
            return Err(ReconcileError::NotAwaiting {
                id: id.to_string(),
                state: invocation.state.as_str(),
            });
        };
        selection.check(&prompt)?;

        let output = json!(selection);
        self.applied.insert(id.to_string());
        self.resolve(id, output.clone());
        info!("◆ HUMAN ANSWERED {}", id);
        Ok(output)
    }

    /// True when the last assistant message finished with every tool call resolved
    pub fn should_continue(&self) -> bool {
        if self.open.is_some() || self.failure.is_some() {
            return false;
        }
        match self.messages.last() {
            Some(message) if message.role == Role::Assistant => {
                let mut tools = message.tools().peekable();
                tools.peek().is_some() && tools.all(ToolInvocation::is_resolved)
            }
            _ => false,
        }
    }

    /// The transport failed mid-turn. Drops tool calls that never got
    /// complete input; committed state is left as it is.
    pub fn fail_turn(&mut self, error: impl Into<String>) {
        let error = error.into();
        warn!("◆ TURN FAILED: {}", error);
        if let Some(index) = self.open.take() {
            let message = &mut self.messages[index];
            message.parts.retain(|p| match p {
                Part::Tool(t) => t.state != ToolState::Streaming,
                Part::Text { .. } => true,
            });
            if message.parts.is_empty() {
                self.messages.remove(index);
            }
        }
        self.failure = Some(error);
    }

    /// History as sent to the engine. Tool calls appear only once resolved.
    pub fn to_provider_messages(&self) -> Vec<Message> {
        let mut out = Vec::new();
        for message in &self.messages {
            match message.role {
                Role::User => out.push(Message::user(message.text())),
                Role::Assistant => {
                    let resolved: Vec<&ToolInvocation> =
                        message.tools().filter(|t| t.is_resolved()).collect();
                    let text = message.text();
                    if text.is_empty() && resolved.is_empty() {
                        continue;
                    }

                    let calls = resolved
                        .iter()
                        .map(|t| {
                            ToolCallDef::new(
                                &t.id,
                                &t.name,
                                t.input.clone().unwrap_or_else(|| json!({})),
                            )
                        })
                        .collect();
                    let content = if text.is_empty() { None } else { Some(text) };
                    out.push(Message::assistant_with_tools(content, calls));

                    for t in resolved {
                        let output = t.output.clone().unwrap_or(Value::Null);
                        out.push(Message::tool(&t.id, &t.name, output.to_string()));
                    }
                }
            }
        }
        out
    }

    /// Start over: empty conversation, fresh task
    pub fn reset(&mut self) {
        self.store.reset();
        self.messages.clear();
        self.applied.clear();
        self.open = None;
        self.failure = None;
        self.usage = Usage::default();
        info!("◆ CONVERSATION RESET");
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("messages", &self.messages.len())
            .field("applied", &self.applied.len())
            .field("streaming", &self.open.is_some())
            .finish()
    }
}
