/// Mode registry for the build assistant
///
/// Every chat mode is answered by a [`DataSource`]. The registry holds one
/// primary source (live API or built-in samples, chosen by configuration) and
/// always keeps the sample source as a fallback, so a reply is produced even
/// when the backend is unreachable.
///
/// # Architecture
///
/// - `live` - HTTP client for the per-mode `/api/{mode}` endpoints
/// - `sample` - canned replies for every mode
///
/// # Usage
///
/// ```rust,no_run
/// use buildwise::modes::{ModeRegistry, ModeRequest};
/// use buildwise::types::{ChatMode, ExpertiseLevel};
///
/// # async fn example() {
/// let registry = ModeRegistry::sample();
/// let request = ModeRequest::new(ChatMode::BuildRecommendation, "1.5M won gaming PC", ExpertiseLevel::Beginner);
/// let reply = registry.respond(&request).await;
/// # }
/// ```
mod live;
mod sample;

pub use live::LiveSource;
pub use sample::SampleSource;

use crate::error::{AppError, AppResult};
use crate::types::{ChatMode, ExpertiseLevel};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub struct ModeRequest {
    pub mode: ChatMode,
    pub prompt: String,
    pub level: ExpertiseLevel,
    pub session_id: Option<i64>,
}

impl ModeRequest {
    pub fn new(mode: ChatMode, prompt: impl Into<String>, level: ExpertiseLevel) -> Self {
        Self {
            mode,
            prompt: prompt.into(),
            level,
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: i64) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// Something that can answer a chat mode with markdown or a JSON string.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn respond(&self, request: &ModeRequest) -> AppResult<String>;
}

pub struct ModeRegistry {
    primary: Arc<dyn DataSource>,
    fallback: SampleSource,
}

impl ModeRegistry {
    pub fn new(primary: Arc<dyn DataSource>) -> Self {
        Self {
            primary,
            fallback: SampleSource,
        }
    }

    /// Registry answering from built-in samples only.
    pub fn sample() -> Self {
        Self::new(Arc::new(SampleSource))
    }

    pub fn source_name(&self) -> &'static str {
        self.primary.name()
    }

    /// Answers `request`, falling back to sample data if the primary source
    /// fails or returns nothing.
    pub async fn respond(&self, request: &ModeRequest) -> String {
        match self.primary.respond(request).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                tracing::warn!(
                    source = self.primary.name(),
                    mode = request.mode.slug(),
                    "empty reply, using sample data"
                );
                self.fallback.reply_for(request)
            }
            Err(err) => {
                tracing::warn!(
                    source = self.primary.name(),
                    mode = request.mode.slug(),
                    error = %err,
                    "mode request failed, using sample data"
                );
                self.fallback.reply_for(request)
            }
        }
    }

    /// Resolves a mode label before answering. Unknown labels are rejected
    /// without touching the data source.
    pub async fn respond_label(
        &self,
        label: &str,
        prompt: &str,
        level: ExpertiseLevel,
        session_id: Option<i64>,
    ) -> AppResult<String> {
        let mode = ChatMode::from_label(label)
            .ok_or_else(|| AppError::validation(format!("unknown chat mode '{label}'")))?;
        let request = ModeRequest {
            mode,
            prompt: prompt.to_string(),
            level,
            session_id,
        };
        Ok(self.respond(&request).await)
    }
}
