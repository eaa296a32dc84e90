//! Task-building agent core
//!
//! Tool contracts, the conversation reconciler, the option chooser and the
//! session loop that drives the reasoning engine.

use thiserror::Error;

pub mod chooser;
pub mod context;
pub mod conversation;
pub mod lifecycle;
pub mod reconciler;
pub mod tools;

pub use chooser::{ChoiceOutcome, OptionChooser, Selection, SelectionError};
pub use context::ContextBuilder;
pub use conversation::{ChatSession, SessionSettings, TurnOutcome};
pub use lifecycle::{classify, ToolInvocation, ToolState, ToolView};
pub use reconciler::{ChatMessage, Part, PendingPrompt, ReconcileError, Reconciler, Role, Update};
pub use tools::{ToolClass, ToolError, ToolInput, ToolKind, ToolRegistry};

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("◆ ENGINE ERROR: {0}")]
    Provider(String),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("◆ MAX ROUNDS EXCEEDED")]
    MaxIterations,
}

pub type Result<T> = std::result::Result<T, AgentError>;
