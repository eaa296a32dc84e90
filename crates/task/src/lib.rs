//! Monitoring task document
//!
//! The task record built up during a conversation, the store that owns it,
//! the built-in source bundles and the completion gate.

use thiserror::Error;

pub mod gate;
pub mod model;
pub mod store;
pub mod templates;

pub use gate::{CompletionGate, GateStatus};
pub use model::{
    append_sources, apply_scope_update, compute_readiness, set_logic, Entity, EntityType, Filter,
    FilterField, FilterType, Logic, Priority, Rule, Scope, ScopeUpdate, Source, SourceCategory,
    SourceDraft, Task, TaskStatus, UpdateFrequency,
};
pub use store::{StoreSnapshot, SubscriptionId, TaskStore};
pub use templates::{BuiltinTemplates, SourceTemplate, TemplateLookup};

/// Task document errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("◆ SOURCE NOT FOUND: {0}")]
    SourceNotFound(String),

    #[error("◆ INVALID STATUS TRANSITION: {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("◆ TASK NOT READY: needs a scope and at least one source")]
    NotReady,
}

pub type Result<T> = std::result::Result<T, TaskError>;
