use super::Store;
use super::tables::Tables;
use crate::error::{AppError, AppResult};
use crate::types::{ChatMessage, Estimate, MessageRow, NewEstimate, Session};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

/// Store that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    user_id: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            tables: Mutex::default(),
            user_id: Some(user_id.into()),
        }
    }

    fn tables(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|e| AppError::storage(format!("memory store poisoned: {e}")))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_session(&self, name: &str) -> AppResult<Session> {
        Ok(self.tables()?.create_session(name, self.user_id.clone()))
    }

    async fn list_sessions(&self) -> AppResult<Vec<Session>> {
        Ok(self.tables()?.list_sessions())
    }

    async fn delete_session(&self, id: i64) -> AppResult<()> {
        self.tables()?.delete_session(id);
        Ok(())
    }

    async fn delete_messages(&self, session_id: i64) -> AppResult<()> {
        self.tables()?.delete_messages(session_id);
        Ok(())
    }

    async fn insert_message(&self, session_id: i64, message: &ChatMessage) -> AppResult<MessageRow> {
        self.tables()?.insert_message(session_id, message)
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
        Ok(self.tables()?.save_estimate(estimate))
    }

    async fn delete_estimate(&self, id: i64) -> AppResult<()> {
        self.tables()?.delete_estimate(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatMode, ExpertiseLevel, Role};
    use std::collections::BTreeMap;

    fn sample_estimate(title: &str) -> NewEstimate {
        NewEstimate {
            session_id: None,
            title: title.to_string(),
            parts: BTreeMap::new(),
            total_price: "₩0".into(),
            total_reason: String::new(),
            suggestion: None,
            user_id: None,
        }
    }

    #[tokio::test]
    async fn test_user_message_round_trip() {
        let store = MemoryStore::new();
        let session = store.create_session("Quiet office PC").await.unwrap();
        let msg = ChatMessage::user(
            "Is a 650W PSU enough for a 4070?",
            ChatMode::CompatibilityCheck,
            ExpertiseLevel::Intermediate,
        );
        store.insert_message(session.id, &msg).await.unwrap();

        let rows = store.list_messages(session.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        let back = rows[0].to_message();
        assert_eq!(back.role, Role::User);
        assert_eq!(back.text, msg.text);
        assert_eq!(back.chat_mode, msg.chat_mode);
    }

    #[tokio::test]
    async fn test_delete_missing_session_is_noop() {
        let store = MemoryStore::new();
        store.delete_session(404).await.expect("delete of a missing session");
        store.delete_estimate(404).await.expect("delete of a missing estimate");
    }

    #[tokio::test]
    async fn test_delete_session_cascades_to_messages() {
        let store = MemoryStore::new();
        let keep = store.create_session("keep").await.unwrap();
        let doomed = store.create_session("drop").await.unwrap();
        for session in [&keep, &doomed] {
            let msg = ChatMessage::user("hello", ChatMode::GeneralSearch, ExpertiseLevel::Beginner);
            store.insert_message(session.id, &msg).await.unwrap();
        }

        store.delete_session(doomed.id).await.unwrap();

        assert!(store.list_messages(doomed.id).await.unwrap().is_empty());
        assert_eq!(store.list_messages(keep.id).await.unwrap().len(), 1);
        let sessions = store.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_insert_into_missing_session_fails() {
        let store = MemoryStore::new();
        let msg = ChatMessage::assistant("hi", ChatMode::GeneralSearch);
        let err = store.insert_message(99, &msg).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_estimates_newest_first_and_lookup() {
        let store = MemoryStore::for_user("user-1");
        let first = store.save_estimate(sample_estimate("first")).await.unwrap();
        let second = store.save_estimate(sample_estimate("second")).await.unwrap();
        assert_eq!(second.user_id.as_deref(), Some("user-1"));

        let listed = store.list_estimates().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at >= listed[1].created_at);

        assert_eq!(store.get_estimate(first.id).await.unwrap().title, "first");
        store.delete_estimate(first.id).await.unwrap();
        assert!(matches!(
            store.get_estimate(first.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
