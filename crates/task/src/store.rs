//! Task store - the single writer of the task document

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::gate::{CompletionGate, GateStatus};
use crate::model::{
    append_sources, apply_scope_update, compute_readiness, set_logic, Filter, Logic, Priority,
    ScopeUpdate, SourceDraft, Task, TaskStatus,
};
use crate::{Result, TaskError};

/// What observers see after each mutation
#[derive(Debug, Clone, Copy)]
pub struct StoreSnapshot<'a> {
    pub task: &'a Task,
    pub ready: bool,
    pub finalized: bool,
}

/// Handle returned by [`TaskStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn Fn(StoreSnapshot<'_>) + Send + Sync>;

/// Holds the current task snapshot and notifies observers synchronously.
///
/// Not designed for concurrent writers: callers serialize access, either by
/// owning the store on one task or by wrapping it in a mutex.
pub struct TaskStore {
    task: Task,
    ready: bool,
    finalized: bool,
    observers: BTreeMap<SubscriptionId, Observer>,
    next_subscription: u64,
}

impl TaskStore {
    /// Create a store holding a fresh draft
    pub fn new() -> Self {
        Self::with_task(Task::new())
    }

    /// Create a store around an existing snapshot
    pub fn with_task(task: Task) -> Self {
        let ready = compute_readiness(&task);
        Self {
            task,
            ready,
            finalized: false,
            observers: BTreeMap::new(),
            next_subscription: 0,
        }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether the agent has issued its completion signal
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn snapshot(&self) -> StoreSnapshot<'_> {
        StoreSnapshot {
            task: &self.task,
            ready: self.ready,
            finalized: self.finalized,
        }
    }

    pub fn gate(&self) -> GateStatus {
        CompletionGate::evaluate(&self.task, self.finalized)
    }

    /// Register an observer called after every mutation
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(StoreSnapshot<'_>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.insert(id, Box::new(observer));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(&id).is_some()
    }

    fn commit(&mut self, next: Task) {
        self.task = next;
        self.ready = compute_readiness(&self.task);
        debug!(
            "◆ TASK {} COMMITTED (ready={}, finalized={})",
            self.task.id, self.ready, self.finalized
        );
        let snapshot = self.snapshot();
        for observer in self.observers.values() {
            observer(snapshot);
        }
    }

    // ---- agent-driven mutations ----

    pub fn update_scope(&mut self, update: &ScopeUpdate) {
        let next = apply_scope_update(&self.task, update);
        self.commit(next);
    }

    /// Append sources and return the ids assigned to them
    pub fn add_sources(&mut self, drafts: &[SourceDraft]) -> Vec<String> {
        let next = append_sources(&self.task, drafts);
        let ids = next.sources[self.task.sources.len()..]
            .iter()
            .map(|s| s.id.clone())
            .collect();
        self.commit(next);
        ids
    }

    pub fn set_logic(&mut self, logic: Logic) {
        let next = set_logic(&self.task, logic);
        self.commit(next);
    }

    /// Set the logic and raise the completion signal; status is left alone
    pub fn finalize(&mut self, logic: Logic) {
        self.finalized = true;
        let next = set_logic(&self.task, logic);
        self.commit(next);
    }

    // ---- user-driven edits ----

    pub fn remove_keyword(&mut self, keyword: &str) {
        let mut next = self.task.clone();
        next.scope.keywords.retain(|k| k != keyword);
        self.commit(next);
    }

    pub fn remove_entity(&mut self, name: &str) {
        let mut next = self.task.clone();
        next.scope.entities.retain(|e| e.name != name);
        self.commit(next);
    }

    /// Add a filter; an identical filter already present is left as is
    pub fn add_filter(&mut self, filter: Filter) {
        let mut next = self.task.clone();
        if !next.scope.filters.contains(&filter) {
            next.scope.filters.push(filter);
        }
        self.commit(next);
    }

    pub fn remove_filter(&mut self, filter: &Filter) {
        let mut next = self.task.clone();
        next.scope.filters.retain(|f| f != filter);
        self.commit(next);
    }

    pub fn remove_source(&mut self, id: &str) -> Result<()> {
        self.require_source(id)?;
        let mut next = self.task.clone();
        next.sources.retain(|s| s.id != id);
        self.commit(next);
        Ok(())
    }

    /// Flip a source's enabled flag and return the new value
    pub fn toggle_source(&mut self, id: &str) -> Result<bool> {
        self.require_source(id)?;
        let mut next = self.task.clone();
        let mut enabled = false;
        for source in next.sources.iter_mut().filter(|s| s.id == id) {
            source.enabled = !source.enabled;
            enabled = source.enabled;
        }
        self.commit(next);
        Ok(enabled)
    }

    pub fn set_source_priority(&mut self, id: &str, priority: Priority) -> Result<()> {
        self.require_source(id)?;
        let mut next = self.task.clone();
        for source in next.sources.iter_mut().filter(|s| s.id == id) {
            source.priority = priority;
        }
        self.commit(next);
        Ok(())
    }

    fn require_source(&self, id: &str) -> Result<()> {
        match self.task.source(id) {
            Some(_) => Ok(()),
            None => Err(TaskError::SourceNotFound(id.to_string())),
        }
    }

    // ---- explicit status actions ----

    /// The user's "create" action: draft -> ready, only when the gate is open
    pub fn create(&mut self) -> Result<()> {
        if self.task.status != TaskStatus::Draft {
            return Err(TaskError::InvalidTransition {
                from: self.task.status,
                to: TaskStatus::Ready,
            });
        }
        if !self.gate().can_create {
            return Err(TaskError::NotReady);
        }
        self.advance(TaskStatus::Ready)
    }

    /// ready -> active
    pub fn activate(&mut self) -> Result<()> {
        self.advance(TaskStatus::Active)
    }

    fn advance(&mut self, to: TaskStatus) -> Result<()> {
        let from = self.task.status;
        if from.next() != Some(to) {
            return Err(TaskError::InvalidTransition { from, to });
        }
        let mut next = self.task.clone();
        next.status = to;
        info!("◆ TASK {} STATUS {} -> {}", next.id, from, to);
        self.commit(next);
        Ok(())
    }

    // ---- lifecycle ----

    /// Discard everything and start over with a new empty draft
    pub fn reset(&mut self) {
        self.finalized = false;
        let next = Task::new();
        info!("◆ TASK RESET, NEW ID {}", next.id);
        self.commit(next);
    }

    /// Install a previously saved snapshot
    pub fn restore(&mut self, task: Task, finalized: bool) {
        self.finalized = finalized;
        self.commit(task);
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("task", &self.task)
            .field("ready", &self.ready)
            .field("finalized", &self.finalized)
            .field("observers", &self.observers.len())
            .finish()
    }
}
