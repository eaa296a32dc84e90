//! Completion gate

use serde::Serialize;

use crate::model::{compute_readiness, Task, TaskStatus};

/// Derived completion signals for the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateStatus {
    /// Minimum content present
    pub ready: bool,
    /// The agent called finalize-task
    pub finalized: bool,
    /// The "create" action may be offered
    pub can_create: bool,
}

pub struct CompletionGate;

impl CompletionGate {
    /// Recomputed from the snapshot every time, never cached
    pub fn evaluate(task: &Task, finalized: bool) -> GateStatus {
        let ready = compute_readiness(task);
        GateStatus {
            ready,
            finalized,
            can_create: ready && task.status == TaskStatus::Draft,
        }
    }
}
