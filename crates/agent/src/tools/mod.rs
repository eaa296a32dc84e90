//! Agent tool contracts
//!
//! The closed set of tools the agent may call. Every call is validated here
//! into a typed [`ToolInput`] before anything touches the task store.

pub mod finalize;
pub mod options;
pub mod scope;
pub mod sources;

pub use options::{OptionItem, OptionsPrompt};
pub use sources::SourcesRequest;

use std::sync::Arc;

use monitask_provider::Tool;
use monitask_task::{BuiltinTemplates, Logic, ScopeUpdate, SourceDraft, TemplateLookup};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Tool validation errors. Each one fails a single invocation only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("◆ TOOLKIT '{0}' NOT FOUND")]
    UnknownTool(String),

    #[error("◆ INVALID INPUT FOR {tool}: {reason}")]
    InvalidInput { tool: &'static str, reason: String },

    #[error("◆ UNKNOWN BUNDLE: {0}")]
    UnknownBundle(String),
}

/// Who produces the result of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolClass {
    /// Applied as soon as the input is complete
    Server,
    /// Waits for a human decision
    Client,
}

/// Every tool the agent knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    PresentOptions,
    UpdateScope,
    AddSources,
    FinalizeTask,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::PresentOptions,
        ToolKind::UpdateScope,
        ToolKind::AddSources,
        ToolKind::FinalizeTask,
    ];

    /// Resolve a wire name, including the older camelCase names
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "present-options" | "presentOptions" => Some(ToolKind::PresentOptions),
            "update-scope" | "updateScope" | "updateMonitoringTask" => Some(ToolKind::UpdateScope),
            "add-sources" | "addSources" | "addSourceTemplate" => Some(ToolKind::AddSources),
            "finalize-task" | "finalizeTask" | "confirmTask" => Some(ToolKind::FinalizeTask),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::PresentOptions => "present-options",
            ToolKind::UpdateScope => "update-scope",
            ToolKind::AddSources => "add-sources",
            ToolKind::FinalizeTask => "finalize-task",
        }
    }

    pub fn class(&self) -> ToolClass {
        match self {
            ToolKind::PresentOptions => ToolClass::Client,
            ToolKind::UpdateScope | ToolKind::AddSources | ToolKind::FinalizeTask => {
                ToolClass::Server
            }
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::PresentOptions => {
                "Ask the user a question with 2-8 clickable options. The user's choice is returned as the result."
            }
            ToolKind::UpdateScope => {
                "Update what is being monitored: topic, description, keywords, entities and intent. Keywords and entities are merged."
            }
            ToolKind::AddSources => {
                "Add sources to monitor, either as a list or as a named bundle."
            }
            ToolKind::FinalizeTask => {
                "Summarize the monitoring logic once the task is complete."
            }
        }
    }

    /// JSON schema for the tool input
    pub fn parameters(&self, templates: &dyn TemplateLookup) -> Value {
        match self {
            ToolKind::PresentOptions => options::schema(),
            ToolKind::UpdateScope => scope::schema(),
            ToolKind::AddSources => sources::schema(templates),
            ToolKind::FinalizeTask => finalize::schema(),
        }
    }
}

/// A validated tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    PresentOptions(OptionsPrompt),
    UpdateScope(ScopeUpdate),
    AddSources {
        bundle: Option<String>,
        drafts: Vec<SourceDraft>,
    },
    FinalizeTask(Logic),
}

impl ToolInput {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInput::PresentOptions(_) => ToolKind::PresentOptions,
            ToolInput::UpdateScope(_) => ToolKind::UpdateScope,
            ToolInput::AddSources { .. } => ToolKind::AddSources,
            ToolInput::FinalizeTask(_) => ToolKind::FinalizeTask,
        }
    }
}

/// Validates tool calls and advertises the tool set
#[derive(Clone)]
pub struct ToolRegistry {
    templates: Arc<dyn TemplateLookup>,
}

impl ToolRegistry {
    pub fn new(templates: Arc<dyn TemplateLookup>) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &dyn TemplateLookup {
        self.templates.as_ref()
    }

    pub fn kind(&self, name: &str) -> Option<ToolKind> {
        ToolKind::from_name(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        ToolKind::ALL.iter().map(|k| k.name()).collect()
    }

    pub fn definitions(&self) -> Vec<Tool> {
        ToolKind::ALL
            .iter()
            .map(|k| Tool::new(k.name(), k.description(), k.parameters(self.templates())))
            .collect()
    }

    /// Check a call against its contract
    pub fn validate(&self, name: &str, input: &Value) -> Result<ToolInput, ToolError> {
        let kind =
            ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        if !input.is_object() {
            return Err(ToolError::InvalidInput {
                tool: kind.name(),
                reason: "input must be a JSON object".to_string(),
            });
        }

        let invalid = |reason: String| ToolError::InvalidInput {
            tool: kind.name(),
            reason,
        };

        let validated = match kind {
            ToolKind::PresentOptions => {
                ToolInput::PresentOptions(OptionsPrompt::from_value(input).map_err(invalid)?)
            }
            ToolKind::UpdateScope => ToolInput::UpdateScope(scope::parse(input).map_err(invalid)?),
            ToolKind::AddSources => match sources::parse(input).map_err(invalid)? {
                SourcesRequest::Drafts(drafts) => ToolInput::AddSources {
                    bundle: None,
                    drafts,
                },
                SourcesRequest::Bundle(id) => {
                    let template = self
                        .templates
                        .lookup(&id)
                        .ok_or(ToolError::UnknownBundle(id))?;
                    ToolInput::AddSources {
                        bundle: Some(template.id),
                        drafts: template.sources,
                    }
                }
            },
            ToolKind::FinalizeTask => {
                ToolInput::FinalizeTask(finalize::parse(input).map_err(invalid)?)
            }
        };

        debug!("◆ VALIDATED {}", kind.name());
        Ok(validated)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(Arc::new(BuiltinTemplates::new()))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
