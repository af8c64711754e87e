//! File-backed store
//!
//! Keeps the same tables as [`MemoryStore`](super::MemoryStore) and writes
//! them to a single JSON document after every mutation. Used when no hosted
//! store is configured.

use super::Store;
use super::tables::Tables;
use crate::error::{AppError, AppResult};
use crate::types::{ChatMessage, Estimate, MessageRow, NewEstimate, Session};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub struct FileStore {
    path: PathBuf,
    tables: Mutex<Tables>,
    user_id: Option<String>,
}

/// Default location of the store document for a user profile.
pub fn default_store_path(user_id: Option<&str>) -> PathBuf {
    let file_name = match user_id {
        Some(user) if !user.trim().is_empty() => format!("store-{}.json", sanitize_profile(user)),
        _ => "store.json".to_string(),
    };

    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("buildwise").join(file_name);
    }

    PathBuf::from("cache").join(file_name)
}

/// Sanitize a profile name for filesystem use
fn sanitize_profile(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}

impl FileStore {
    /// Opens (or creates) the store document at `path`.
    pub fn open(path: impl Into<PathBuf>, user_id: Option<String>) -> AppResult<Self> {
        let path = path.into();
        let tables = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Tables::default()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    AppError::storage(format!("corrupt store file {}: {e}", path.display()))
                })?
            }
        } else {
            Tables::default()
        };
        tracing::info!(path = %path.display(), "opened file store");
        Ok(Self {
            path,
            tables: Mutex::new(tables),
            user_id,
        })
    }

    pub fn open_default(user_id: Option<String>) -> AppResult<Self> {
        let path = default_store_path(user_id.as_deref());
        Self::open(path, user_id)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tables(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|e| AppError::storage(format!("file store poisoned: {e}")))
    }

    /// Applies `change` and flushes the tables to disk while still holding the lock.
    fn write<T>(&self, change: impl FnOnce(&mut Tables) -> AppResult<T>) -> AppResult<T> {
        let mut tables = self.tables()?;
        let out = change(&mut tables)?;
        self.flush(&tables)?;
        Ok(out)
    }

    fn flush(&self, tables: &Tables) -> AppResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::storage(format!("Failed to create store directory: {e}")))?;
        }
        let json = serde_json::to_string_pretty(tables)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| AppError::storage(format!("Failed to write store: {e}")))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| AppError::storage(format!("Failed to replace store: {e}")))
    }
}

#[async_trait]
impl Store for FileStore {
    async fn create_session(&self, name: &str) -> AppResult<Session> {
        let user_id = self.user_id.clone();
        self.write(|tables| Ok(tables.create_session(name, user_id)))
    }

    async fn list_sessions(&self) -> AppResult<Vec<Session>> {
        Ok(self.tables()?.list_sessions())
    }

    async fn delete_session(&self, id: i64) -> AppResult<()> {
        self.write(|tables| {
            tables.delete_session(id);
            Ok(())
        })
    }

    async fn delete_messages(&self, session_id: i64) -> AppResult<()> {
        self.write(|tables| {
            tables.delete_messages(session_id);
            Ok(())
        })
    }

    async fn insert_message(&self, session_id: i64, message: &ChatMessage) -> AppResult<MessageRow> {
        self.write(|tables| tables.insert_message(session_id, message))
    }

    async fn list_messages(&self, session_id: i64) -> AppResult<Vec<MessageRow>> {
        Ok(self.tables()?.list_messages(session_id))
    }

    async fn list_estimates(&self) -> AppResult<Vec<Estimate>> {
        Ok(self.tables()?.list_estimates())
    }

    async fn get_estimate(&self, id: i64) -> AppResult<Estimate> {
        self.tables()?.get_estimate(id)
    }

    async fn save_estimate(&self, mut estimate: NewEstimate) -> AppResult<Estimate> {
        if estimate.user_id.is_none() {
            estimate.user_id = self.user_id.clone();
        }
        self.write(|tables| Ok(tables.save_estimate(estimate)))
    }

    async fn delete_estimate(&self, id: i64) -> AppResult<()> {
        self.write(|tables| {
            tables.delete_estimate(id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_profile() {
        assert_eq!(sanitize_profile("user-1"), "user-1");
        assert_eq!(sanitize_profile("me@example.com"), "me_example_com");
        assert_eq!(sanitize_profile("../../etc"), "______etc");
    }

    #[test]
    fn test_default_path_per_profile() {
        let shared = default_store_path(None);
        assert!(shared.ends_with("store.json"));
        let personal = default_store_path(Some("kim"));
        assert!(personal.ends_with("store-kim.json"));
        assert_eq!(default_store_path(Some("  ")), shared);
    }
}
