//! Integration tests for monitask-session
//!
//! Covers snapshot creation, save/load round trips, the cache, key
//! sanitization, listing and deletion.

use monitask_session::{SessionManager, SessionRecord};
use monitask_task::{BuiltinTemplates, Logic, ScopeUpdate, TaskStore, TemplateLookup};

fn populated_store() -> TaskStore {
    let mut store = TaskStore::new();
    store.update_scope(&ScopeUpdate {
        topic: Some("Tesla".into()),
        keywords: Some(vec!["stock".into(), "earnings".into()]),
        ..ScopeUpdate::default()
    });
    let bundle = BuiltinTemplates::new()
        .lookup("financial-news")
        .expect("built-in bundle");
    store.add_sources(&bundle.sources);
    store
}

#[test]
fn test_record_creation() {
    let record = SessionRecord::new("cli:default");

    assert_eq!(record.key, "cli:default");
    assert!(!record.finalized);
    assert!(record.task.sources.is_empty());
    assert_eq!(record.created_at, record.updated_at);
}

#[tokio::test]
async fn test_get_or_create_new_session() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut manager = SessionManager::new(temp_dir.path());

    let record = manager.get_or_create("cli:new").await;
    assert_eq!(record.key, "cli:new");
    assert!(record.task.scope.topic.is_none());
}

#[tokio::test]
async fn test_get_or_create_returns_cached() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut manager = SessionManager::new(temp_dir.path());
    let store = populated_store();

    manager.get_or_create("cli:a").await.capture(&store);

    let again = manager.get_or_create("cli:a").await;
    assert_eq!(again.task.scope.topic.as_deref(), Some("Tesla"));
}

#[tokio::test]
async fn test_save_and_load_roundtrip() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut manager = SessionManager::new(temp_dir.path());

    let mut store = populated_store();
    store.finalize(Logic::new("Track Tesla stock news"));

    let mut record = SessionRecord::new("cli:tesla");
    record.capture(&store);
    manager.save(&record).await.unwrap();

    let fresh = SessionManager::new(temp_dir.path());
    let loaded = fresh.load("cli:tesla").await.expect("saved session");
    assert_eq!(loaded.key, "cli:tesla");
    assert!(loaded.finalized);
    assert_eq!(loaded.task, *store.task());

    let mut restored = TaskStore::new();
    loaded.restore_into(&mut restored);
    assert!(restored.is_ready());
    assert!(restored.is_finalized());
    assert_eq!(restored.task().sources.len(), 3);
}

#[tokio::test]
async fn test_save_creates_directory_and_sanitized_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let dir = temp_dir.path().join("nested").join("sessions");
    let mut manager = SessionManager::new(&dir);

    manager.save(&SessionRecord::new("cli:a/b")).await.unwrap();

    assert!(dir.join("cli_a_b.json").exists());
}

#[tokio::test]
async fn test_list_reads_keys_from_files() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut manager = SessionManager::new(temp_dir.path());

    manager.save(&SessionRecord::new("cli:b")).await.unwrap();
    manager.save(&SessionRecord::new("cli:a")).await.unwrap();
    tokio::fs::write(temp_dir.path().join("notes.txt"), "ignored")
        .await
        .unwrap();
    tokio::fs::write(temp_dir.path().join("broken.json"), "{ nope")
        .await
        .unwrap();

    assert_eq!(manager.list().await, vec!["cli:a", "cli:b"]);
}

#[tokio::test]
async fn test_list_missing_directory_is_empty() {
    let temp_dir = tempfile::tempdir().unwrap();
    let manager = SessionManager::new(temp_dir.path().join("absent"));
    assert!(manager.list().await.is_empty());
}

#[tokio::test]
async fn test_delete_removes_file_and_cache() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut manager = SessionManager::new(temp_dir.path());
    let store = populated_store();

    let mut record = SessionRecord::new("cli:gone");
    record.capture(&store);
    manager.save(&record).await.unwrap();

    assert!(manager.delete("cli:gone").await.unwrap());
    assert!(manager.load("cli:gone").await.is_none());

    let recreated = manager.get_or_create("cli:gone").await;
    assert!(recreated.task.scope.topic.is_none());
}

#[tokio::test]
async fn test_delete_nonexistent_session() {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut manager = SessionManager::new(temp_dir.path());
    assert!(!manager.delete("never:saved").await.unwrap());
}

#[tokio::test]
async fn test_corrupted_session_starts_fresh() {
    let temp_dir = tempfile::tempdir().unwrap();
    tokio::fs::write(temp_dir.path().join("cli_bad.json"), "{ invalid json }")
        .await
        .unwrap();

    let mut manager = SessionManager::new(temp_dir.path());
    assert!(manager.load("cli:bad").await.is_none());

    let record = manager.get_or_create("cli:bad").await;
    assert_eq!(record.key, "cli:bad");
    assert!(record.task.sources.is_empty());
}
