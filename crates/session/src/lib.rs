//! Session-scoped task snapshots
//!
//! One JSON file per session key holds the task being configured and its
//! completion flag, so a chat can pick up where it left off.

use chrono::{DateTime, Local};
use monitask_config::paths::safe_filename;
use monitask_task::{Task, TaskStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("◆ SESSION STORAGE ERROR: {0}")]
    Io(#[from] std::io::Error),

    #[error("◆ SESSION DECODE ERROR: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// A persisted task snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Session key (e.g. `cli:default`)
    pub key: String,
    pub task: Task,
    #[serde(default)]
    pub finalized: bool,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

impl SessionRecord {
    pub fn new(key: impl Into<String>) -> Self {
        let now = Local::now();
        Self {
            key: key.into(),
            task: Task::new(),
            finalized: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Take the current state of a store
    pub fn capture(&mut self, store: &TaskStore) {
        self.task = store.task().clone();
        self.finalized = store.is_finalized();
        self.updated_at = Local::now();
    }

    /// Put this snapshot back into a store
    pub fn restore_into(&self, store: &mut TaskStore) {
        store.restore(self.task.clone(), self.finalized);
    }
}

/// Manages session snapshots on disk
pub struct SessionManager {
    sessions_dir: PathBuf,
    cache: HashMap<String, SessionRecord>,
}

impl SessionManager {
    pub fn new(sessions_dir: impl AsRef<Path>) -> Self {
        Self {
            sessions_dir: sessions_dir.as_ref().to_path_buf(),
            cache: HashMap::new(),
        }
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    /// Get or create a session
    pub async fn get_or_create(&mut self, key: &str) -> &mut SessionRecord {
        if !self.cache.contains_key(key) {
            let record = match self.load(key).await {
                Some(record) => record,
                None => SessionRecord::new(key),
            };
            self.cache.insert(key.to_string(), record);
        }
        self.cache
            .entry(key.to_string())
            .or_insert_with(|| SessionRecord::new(key))
    }

    /// Write a snapshot and refresh the cache
    pub async fn save(&mut self, record: &SessionRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.sessions_dir).await?;
        let path = self.session_path(&record.key);
        let content = serde_json::to_string_pretty(record)?;
        tokio::fs::write(path, content).await?;
        self.cache.insert(record.key.clone(), record.clone());
        debug!("◆ SESSION SAVED: {}", record.key);
        Ok(())
    }

    /// Load a snapshot from disk. Unreadable files are treated as absent.
    pub async fn load(&self, key: &str) -> Option<SessionRecord> {
        let path = self.session_path(key);
        if !path.exists() {
            return None;
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("◆ FAILED TO READ SESSION {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str::<SessionRecord>(&content) {
            Ok(record) => {
                debug!("◆ SESSION LOADED: {}", key);
                Some(record)
            }
            Err(e) => {
                warn!("◆ FAILED TO PARSE SESSION {}: {}", key, e);
                None
            }
        }
    }

    fn session_path(&self, key: &str) -> PathBuf {
        self.sessions_dir
            .join(format!("{}.json", safe_filename(key)))
    }

    /// Delete a session. Returns whether a file was removed.
    pub async fn delete(&mut self, key: &str) -> Result<bool> {
        self.cache.remove(key);
        let path = self.session_path(key);
        if path.exists() {
            tokio::fs::remove_file(path).await?;
            debug!("◆ SESSION DELETED: {}", key);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Keys of all readable sessions, sorted
    pub async fn list(&self) -> Vec<String> {
        let mut keys = Vec::new();

        if let Ok(mut entries) = tokio::fs::read_dir(&self.sessions_dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let is_json = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.ends_with(".json"));
                if !is_json {
                    continue;
                }

                if let Ok(content) = tokio::fs::read_to_string(entry.path()).await {
                    if let Ok(record) = serde_json::from_str::<SessionRecord>(&content) {
                        keys.push(record.key);
                    }
                }
            }
        }

        keys.sort();
        keys
    }
}
