use crate::error::{AppError, AppResult};
use crate::types::{ChatMessage, Estimate, MessageRow, NewEstimate, Session};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// In-process rows shared by the memory and file stores.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
    #[serde(default)]
    next_id: i64,
    #[serde(default)]
    sessions: Vec<Session>,
    #[serde(default)]
    messages: Vec<MessageRow>,
    #[serde(default)]
    estimates: Vec<Estimate>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn create_session(&mut self, name: &str, user_id: Option<String>) -> Session {
        let session = Session {
            id: self.allocate_id(),
            name: name.to_string(),
            created_at: OffsetDateTime::now_utc(),
            user_id,
        };
        self.sessions.push(session.clone());
        session
    }

    /// Newest first.
    pub(crate) fn list_sessions(&self) -> Vec<Session> {
        let mut sessions = self.sessions.clone();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        sessions
    }

    pub(crate) fn delete_messages(&mut self, session_id: i64) -> usize {
        let before = self.messages.len();
        self.messages.retain(|row| row.session_id != session_id);
        before - self.messages.len()
    }

    /// Removes the session's messages first, then the session itself.
    /// Returns whether anything was removed.
    pub(crate) fn delete_session(&mut self, id: i64) -> bool {
        let removed_messages = self.delete_messages(id);
        let before = self.sessions.len();
        self.sessions.retain(|session| session.id != id);
        removed_messages > 0 || before != self.sessions.len()
    }

    pub(crate) fn has_session(&self, id: i64) -> bool {
        self.sessions.iter().any(|session| session.id == id)
    }

    pub(crate) fn insert_message(
        &mut self,
        session_id: i64,
        message: &ChatMessage,
    ) -> AppResult<MessageRow> {
        if !self.has_session(session_id) {
            return Err(AppError::not_found(format!("session {session_id}")));
        }
        let row = MessageRow::from_message(self.allocate_id(), session_id, message);
        self.messages.push(row.clone());
        Ok(row)
    }

    /// Creation order.
    pub(crate) fn list_messages(&self, session_id: i64) -> Vec<MessageRow> {
        let mut rows: Vec<MessageRow> = self
            .messages
            .iter()
            .filter(|row| row.session_id == session_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        rows
    }

    pub(crate) fn save_estimate(&mut self, estimate: NewEstimate) -> Estimate {
        let estimate = estimate.into_estimate(self.allocate_id(), OffsetDateTime::now_utc());
        self.estimates.push(estimate.clone());
        estimate
    }

    /// Newest first.
    pub(crate) fn list_estimates(&self) -> Vec<Estimate> {
        let mut estimates = self.estimates.clone();
        estimates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        estimates
    }

    pub(crate) fn get_estimate(&self, id: i64) -> AppResult<Estimate> {
        self.estimates
            .iter()
            .find(|estimate| estimate.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("estimate {id}")))
    }

    pub(crate) fn delete_estimate(&mut self, id: i64) -> bool {
        let before = self.estimates.len();
        self.estimates.retain(|estimate| estimate.id != id);
        before != self.estimates.len()
    }
}
