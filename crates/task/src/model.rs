//! Task document schema and the pure operations over it
//!
//! Every operation takes a snapshot by reference and returns the next
//! snapshot. Shape validation happens before these functions are reached;
//! here only the data invariants are defended (keyword set semantics, entity
//! de-duplication by name, id assignment for sources).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// Task lifecycle status. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Draft,
    Ready,
    Active,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Draft => "draft",
            TaskStatus::Ready => "ready",
            TaskStatus::Active => "active",
        }
    }

    /// The single status that may follow this one, if any
    pub fn next(&self) -> Option<TaskStatus> {
        match self {
            TaskStatus::Draft => Some(TaskStatus::Ready),
            TaskStatus::Ready => Some(TaskStatus::Active),
            TaskStatus::Active => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a tracked real-world subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Company,
    Person,
    Product,
    #[serde(alias = "topic")]
    Organization,
    Other,
}

/// A named subject; the name is the key within a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

impl Entity {
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Include,
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Title,
    Content,
    Source,
    Author,
}

/// Scope-narrowing constraint applied across all sources
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FilterField>,
}

impl Filter {
    pub fn include(pattern: impl Into<String>) -> Self {
        Self {
            filter_type: FilterType::Include,
            pattern: pattern.into(),
            field: None,
        }
    }

    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self {
            filter_type: FilterType::Exclude,
            pattern: pattern.into(),
            field: None,
        }
    }

    pub fn on(mut self, field: FilterField) -> Self {
        self.field = Some(field);
        self
    }
}

/// What is being watched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Insertion-ordered set
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
}

impl Scope {
    pub fn has_content(&self) -> bool {
        self.topic.is_some() || !self.keywords.is_empty() || !self.entities.is_empty()
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Website,
    Social,
    #[serde(alias = "rss")]
    News,
    Financial,
    Code,
    Government,
    #[serde(alias = "api")]
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateFrequency {
    Realtime,
    Hourly,
    #[default]
    Daily,
    Weekly,
}

/// A committed feed to monitor. Only `append_sources` creates these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    pub category: SourceCategory,
    pub name: String,
    pub identifier: String,
    pub priority: Priority,
    pub update_frequency: UpdateFrequency,
    pub enabled: bool,
}

/// A source as proposed by the agent or a bundle, before an id exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDraft {
    pub category: SourceCategory,
    pub name: String,
    #[serde(alias = "url")]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_frequency: Option<UpdateFrequency>,
}

impl SourceDraft {
    pub fn new(
        category: SourceCategory,
        name: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            category,
            name: name.into(),
            identifier: identifier.into(),
            priority: None,
            update_frequency: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_frequency(mut self, frequency: UpdateFrequency) -> Self {
        self.update_frequency = Some(frequency);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub condition: String,
    pub action: String,
}

/// Finalized monitoring rationale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logic {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

impl Logic {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            rules: Vec::new(),
        }
    }
}

/// Partial scope as issued by the agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl ScopeUpdate {
    pub fn is_empty(&self) -> bool {
        self.topic.is_none()
            && self.description.is_none()
            && self.keywords.as_ref().map_or(true, Vec::is_empty)
            && self.entities.as_ref().map_or(true, Vec::is_empty)
            && self.intent.is_none()
    }
}

/// The root aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<Logic>,
}

impl Task {
    /// Fresh empty draft with a new id
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            status: TaskStatus::Draft,
            created_at: Utc::now(),
            scope: Scope::default(),
            sources: Vec::new(),
            logic: None,
        }
    }

    pub fn source(&self, id: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.id == id)
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

/// Blank strings count as absent
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Merge a partial scope into the snapshot.
///
/// Text fields are overwritten when present, keywords are unioned in
/// first-insertion order, entities are appended unless the name already
/// exists (the first declared type is kept).
pub fn apply_scope_update(task: &Task, update: &ScopeUpdate) -> Task {
    let mut next = task.clone();
    let scope = &mut next.scope;

    if let Some(topic) = present(&update.topic) {
        scope.topic = Some(topic);
    }
    if let Some(description) = present(&update.description) {
        scope.description = Some(description);
    }
    if let Some(intent) = present(&update.intent) {
        scope.intent = Some(intent);
    }

    if let Some(keywords) = &update.keywords {
        let mut seen: HashSet<String> = scope.keywords.iter().cloned().collect();
        for keyword in keywords {
            let keyword = keyword.trim();
            if keyword.is_empty() {
                continue;
            }
            if seen.insert(keyword.to_string()) {
                scope.keywords.push(keyword.to_string());
            }
        }
    }

    if let Some(entities) = &update.entities {
        let mut seen: HashSet<String> = scope.entities.iter().map(|e| e.name.clone()).collect();
        for entity in entities {
            let name = entity.name.trim();
            if name.is_empty() {
                continue;
            }
            if seen.insert(name.to_string()) {
                scope.entities.push(Entity::new(name, entity.entity_type));
            }
        }
    }

    next
}

/// Append drafts as new sources, each with a fresh id and defaults filled in
pub fn append_sources(task: &Task, drafts: &[SourceDraft]) -> Task {
    let mut next = task.clone();
    next.sources.extend(drafts.iter().map(|draft| Source {
        id: Uuid::new_v4().to_string(),
        category: draft.category,
        name: draft.name.clone(),
        identifier: draft.identifier.clone(),
        priority: draft.priority.unwrap_or_default(),
        update_frequency: draft.update_frequency.unwrap_or_default(),
        enabled: true,
    }));
    next
}

/// Overwrite the finalized logic
pub fn set_logic(task: &Task, logic: Logic) -> Task {
    let mut next = task.clone();
    next.logic = Some(logic);
    next
}

/// Minimum-content predicate: some scope and at least one source
pub fn compute_readiness(task: &Task) -> bool {
    task.scope.has_content() && !task.sources.is_empty()
}
