//! Integration tests for the task store
//!
//! Covers:
//! - Mutation entry points and readiness recomputation
//! - Synchronous observer notification
//! - User-side edits (keywords, entities, filters, sources)
//! - Explicit status actions
//! - Reset and restore

use monitask_task::{
    Entity, EntityType, Filter, FilterField, Logic, Priority, ScopeUpdate, SourceCategory,
    SourceDraft, TaskError, TaskStatus, TaskStore,
};
use std::sync::{Arc, Mutex};

fn tesla_scope() -> ScopeUpdate {
    ScopeUpdate {
        topic: Some("Tesla".into()),
        keywords: Some(vec!["stock".into()]),
        entities: Some(vec![Entity::new("Tesla", EntityType::Company)]),
        ..Default::default()
    }
}

fn reuters() -> SourceDraft {
    SourceDraft::new(SourceCategory::News, "Reuters", "https://reuters.com")
}

// ============================================================================
// Mutations and readiness
// ============================================================================

#[test]
fn test_new_store_is_not_ready() {
    let store = TaskStore::new();
    assert!(!store.is_ready());
    assert!(!store.is_finalized());
    assert_eq!(store.task().status, TaskStatus::Draft);
}

#[test]
fn test_readiness_follows_every_mutation() {
    let mut store = TaskStore::new();

    store.update_scope(&tesla_scope());
    assert!(!store.is_ready());

    let ids = store.add_sources(&[reuters()]);
    assert!(store.is_ready());

    store.remove_source(&ids[0]).unwrap();
    assert!(!store.is_ready());
}

#[test]
fn test_add_sources_returns_assigned_ids_in_order() {
    let mut store = TaskStore::new();
    store.add_sources(&[reuters()]);

    let ids = store.add_sources(&[
        SourceDraft::new(SourceCategory::Social, "Reddit", "r/teslamotors"),
        SourceDraft::new(SourceCategory::Code, "GitHub", "teslamotors"),
    ]);

    assert_eq!(ids.len(), 2);
    assert_eq!(store.task().sources.len(), 3);
    assert_eq!(store.task().sources[1].id, ids[0]);
    assert_eq!(store.task().sources[2].id, ids[1]);
    assert_eq!(store.task().sources[2].name, "GitHub");
}

#[test]
fn test_finalize_sets_logic_and_signal_but_not_status() {
    let mut store = TaskStore::new();
    store.finalize(Logic::new("Tracking Tesla stock"));

    assert!(store.is_finalized());
    assert_eq!(
        store.task().logic.as_ref().map(|l| l.summary.as_str()),
        Some("Tracking Tesla stock")
    );
    assert_eq!(store.task().status, TaskStatus::Draft);
}

// ============================================================================
// Observers
// ============================================================================

#[test]
fn test_observer_sees_each_commit() {
    let mut store = TaskStore::new();
    let seen: Arc<Mutex<Vec<(usize, bool)>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    store.subscribe(move |snapshot| {
        sink.lock()
            .unwrap()
            .push((snapshot.task.sources.len(), snapshot.ready));
    });

    store.update_scope(&tesla_scope());
    store.add_sources(&[reuters()]);

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![(0, false), (1, true)]);
}

#[test]
fn test_unsubscribe_stops_notifications() {
    let mut store = TaskStore::new();
    let count = Arc::new(Mutex::new(0));

    let sink = Arc::clone(&count);
    let id = store.subscribe(move |_| *sink.lock().unwrap() += 1);

    store.update_scope(&tesla_scope());
    assert!(store.unsubscribe(id));
    assert!(!store.unsubscribe(id));
    store.update_scope(&tesla_scope());

    assert_eq!(*count.lock().unwrap(), 1);
}

// ============================================================================
// User edits
// ============================================================================

#[test]
fn test_remove_keyword_and_entity() {
    let mut store = TaskStore::new();
    store.update_scope(&tesla_scope());

    store.remove_keyword("stock");
    store.remove_entity("Tesla");

    assert!(store.task().scope.keywords.is_empty());
    assert!(store.task().scope.entities.is_empty());
    assert_eq!(store.task().scope.topic.as_deref(), Some("Tesla"));
}

#[test]
fn test_filters_have_set_semantics() {
    let mut store = TaskStore::new();
    let filter = Filter::exclude("rumor").on(FilterField::Title);

    store.add_filter(filter.clone());
    store.add_filter(filter.clone());
    store.add_filter(Filter::include("earnings"));
    assert_eq!(store.task().scope.filters.len(), 2);

    store.remove_filter(&filter);
    assert_eq!(store.task().scope.filters, vec![Filter::include("earnings")]);
}

#[test]
fn test_toggle_and_prioritize_source() {
    let mut store = TaskStore::new();
    let id = store.add_sources(&[reuters()]).remove(0);

    assert_eq!(store.toggle_source(&id), Ok(false));
    assert_eq!(store.toggle_source(&id), Ok(true));

    store.set_source_priority(&id, Priority::Low).unwrap();
    assert_eq!(store.task().sources[0].priority, Priority::Low);
}

#[test]
fn test_unknown_source_id_is_reported() {
    let mut store = TaskStore::new();
    assert_eq!(
        store.remove_source("missing"),
        Err(TaskError::SourceNotFound("missing".into()))
    );
    assert!(store.toggle_source("missing").is_err());
    assert!(store.set_source_priority("missing", Priority::High).is_err());
}

// ============================================================================
// Status actions
// ============================================================================

#[test]
fn test_create_requires_readiness() {
    let mut store = TaskStore::new();
    store.update_scope(&tesla_scope());
    assert_eq!(store.create(), Err(TaskError::NotReady));
    assert_eq!(store.task().status, TaskStatus::Draft);
}

#[test]
fn test_create_then_activate() {
    let mut store = TaskStore::new();
    store.update_scope(&tesla_scope());
    store.add_sources(&[reuters()]);

    store.create().unwrap();
    assert_eq!(store.task().status, TaskStatus::Ready);
    assert!(!store.gate().can_create);

    store.activate().unwrap();
    assert_eq!(store.task().status, TaskStatus::Active);
}

#[test]
fn test_status_never_skips_or_regresses() {
    let mut store = TaskStore::new();
    assert_eq!(
        store.activate(),
        Err(TaskError::InvalidTransition {
            from: TaskStatus::Draft,
            to: TaskStatus::Active
        })
    );

    store.update_scope(&tesla_scope());
    store.add_sources(&[reuters()]);
    store.create().unwrap();
    assert!(matches!(
        store.create(),
        Err(TaskError::InvalidTransition { .. })
    ));

    // Data edits leave the status alone
    store.update_scope(&ScopeUpdate {
        keywords: Some(vec!["earnings".into()]),
        ..Default::default()
    });
    assert_eq!(store.task().status, TaskStatus::Ready);
}

// ============================================================================
// Reset and restore
// ============================================================================

#[test]
fn test_reset_installs_new_empty_draft() {
    let mut store = TaskStore::new();
    store.update_scope(&tesla_scope());
    store.add_sources(&[reuters()]);
    store.finalize(Logic::new("done"));
    store.create().unwrap();
    let old_id = store.task().id.clone();

    store.reset();

    let task = store.task();
    assert_ne!(task.id, old_id);
    assert_eq!(task.status, TaskStatus::Draft);
    assert!(task.scope.topic.is_none());
    assert!(task.scope.keywords.is_empty());
    assert!(task.scope.entities.is_empty());
    assert!(task.sources.is_empty());
    assert!(task.logic.is_none());
    assert!(!store.is_ready());
    assert!(!store.is_finalized());
}

#[test]
fn test_reset_notifies_observers() {
    let mut store = TaskStore::new();
    let ids = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&ids);
    store.subscribe(move |snapshot| sink.lock().unwrap().push(snapshot.task.id.clone()));

    let before = store.task().id.clone();
    store.reset();

    let ids = ids.lock().unwrap();
    assert_eq!(ids.len(), 1);
    assert_ne!(ids[0], before);
}

#[test]
fn test_restore_recomputes_readiness() {
    let mut source = TaskStore::new();
    source.update_scope(&tesla_scope());
    source.add_sources(&[reuters()]);
    let saved = source.task().clone();

    let mut store = TaskStore::new();
    store.restore(saved.clone(), true);

    assert_eq!(store.task(), &saved);
    assert!(store.is_ready());
    assert!(store.is_finalized());
}
