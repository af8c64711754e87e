use crate::error::{AppError, AppResult};
use crate::modes::{ModeRegistry, ModeRequest};
use crate::render::{BuildPayload, ResponseView, select_view};
use crate::store::Store;
use crate::types::{ChatMessage, ChatMode, Estimate, ExpertiseLevel, Session};
use std::sync::Arc;
use tokio::sync::broadcast;

pub const DEFAULT_SESSION_NAME: &str = "New conversation";
const EVENT_CAPACITY: usize = 64;
const PREVIEW_CHARS: usize = 32;

/// Change notifications published after every successful mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    SessionsChanged,
    MessagesChanged(i64),
    EstimatesChanged,
}

/// Result of one user turn.
#[derive(Clone, Debug, PartialEq)]
pub struct Exchange {
    pub user: ChatMessage,
    pub reply: ChatMessage,
    pub estimate: Option<Estimate>,
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn Store>,
    registry: Arc<ModeRegistry>,
    events: broadcast::Sender<StoreEvent>,
}

impl ChatService {
    pub fn new(store: Arc<dyn Store>, registry: ModeRegistry) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            registry: Arc::new(registry),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn source_name(&self) -> &'static str {
        self.registry.source_name()
    }

    fn publish(&self, event: StoreEvent) {
        // No receivers is fine; views subscribe when mounted.
        let _ = self.events.send(event);
    }

    pub async fn create_session(&self, name: Option<&str>) -> AppResult<Session> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_SESSION_NAME);
        let session = self.store.create_session(name).await?;
        tracing::info!(session_id = session.id, "created session");
        self.publish(StoreEvent::SessionsChanged);
        Ok(session)
    }

    pub async fn sessions(&self) -> AppResult<Vec<Session>> {
        self.store.list_sessions().await
    }

    pub async fn messages(&self, session_id: i64) -> AppResult<Vec<ChatMessage>> {
        let rows = self.store.list_messages(session_id).await?;
        Ok(rows.iter().map(|row| row.to_message()).collect())
    }

    /// Removes the session's messages, then the session. Missing ids are a no-op.
    pub async fn delete_session(&self, session_id: i64) -> AppResult<()> {
        self.store.delete_messages(session_id).await?;
        self.store.delete_session(session_id).await?;
        tracing::info!(session_id, "deleted session");
        self.publish(StoreEvent::MessagesChanged(session_id));
        self.publish(StoreEvent::SessionsChanged);
        Ok(())
    }

    /// Stores the user's message, asks the active mode for a reply and stores
    /// that too. Build replies are also saved as an estimate.
    pub async fn send(
        &self,
        session_id: i64,
        text: &str,
        mode: ChatMode,
        level: ExpertiseLevel,
    ) -> AppResult<Exchange> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Err(AppError::validation("message is empty"));
        }

        let user = ChatMessage::user(prompt, mode, level);
        self.store.insert_message(session_id, &user).await?;
        self.publish(StoreEvent::MessagesChanged(session_id));

        let request = ModeRequest::new(mode, prompt, level).with_session(session_id);
        let content = self.registry.respond(&request).await;
        let reply = ChatMessage::assistant(content, mode);
        self.store.insert_message(session_id, &reply).await?;
        self.publish(StoreEvent::MessagesChanged(session_id));

        let view = select_view(&reply.text, Some(mode));
        tracing::debug!(session_id, mode = mode.slug(), view = view.kind(), "reply stored");

        let estimate = match view {
            ResponseView::Build(payload) => Some(self.store_build(&payload, prompt, session_id).await?),
            _ => None,
        };

        Ok(Exchange {
            user,
            reply,
            estimate,
        })
    }

    /// Saves a build reply as an estimate, unless the backend already stored
    /// it and reported its id.
    async fn store_build(
        &self,
        payload: &BuildPayload,
        prompt: &str,
        session_id: i64,
    ) -> AppResult<Estimate> {
        if let Some(id) = payload.estimate_id {
            match self.store.get_estimate(id).await {
                Ok(existing) => {
                    tracing::debug!(estimate_id = id, session_id, "estimate already stored");
                    self.publish(StoreEvent::EstimatesChanged);
                    return Ok(existing);
                }
                Err(AppError::NotFound(_)) => {
                    tracing::warn!(estimate_id = id, "reported estimate is missing, saving a copy");
                }
                Err(err) => return Err(err),
            }
        }

        let new_estimate = payload.to_estimate(&preview_title(prompt), Some(session_id));
        let saved = self.store.save_estimate(new_estimate).await?;
        tracing::info!(estimate_id = saved.id, session_id, "saved estimate");
        self.publish(StoreEvent::EstimatesChanged);
        Ok(saved)
    }

    pub async fn estimates(&self) -> AppResult<Vec<Estimate>> {
        self.store.list_estimates().await
    }

    pub async fn estimate(&self, id: i64) -> AppResult<Estimate> {
        self.store.get_estimate(id).await
    }

    pub async fn delete_estimate(&self, id: i64) -> AppResult<()> {
        self.store.delete_estimate(id).await?;
        tracing::info!(estimate_id = id, "deleted estimate");
        self.publish(StoreEvent::EstimatesChanged);
        Ok(())
    }
}

/// Parses a user-supplied id, rejecting anything that is not a positive integer.
pub fn parse_id(raw: &str) -> AppResult<i64> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::validation(format!("'{trimmed}' is not a valid id"))),
    }
}

/// First line of `source`, cut to a short preview.
pub fn preview_title(source: &str) -> String {
    let first_line = source.lines().next().unwrap_or(source).trim();
    if first_line.chars().count() <= PREVIEW_CHARS {
        return first_line.to_string();
    }
    first_line.chars().take(PREVIEW_CHARS).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id(" 7 ").unwrap(), 7);
        assert!(matches!(parse_id("abc"), Err(AppError::Validation(_))));
        assert!(matches!(parse_id("0"), Err(AppError::Validation(_))));
        assert!(matches!(parse_id("-3"), Err(AppError::Validation(_))));
        assert!(matches!(parse_id(""), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_preview_title() {
        assert_eq!(preview_title("Gaming PC\nbudget 1.5M"), "Gaming PC");
        let long = "I need a workstation for 3D rendering and some light gaming";
        let preview = preview_title(long);
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 1);
        assert!(preview.ends_with('…'));
    }
}
