use super::{DataSource, ModeRequest};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Client for the assistant's per-mode endpoints (`POST /api/{mode}`).
pub struct LiveSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl LiveSource {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn endpoint(&self, request: &ModeRequest) -> String {
        let mut url = format!("{}/api/{}", self.base_url, request.mode.slug());
        if let Some(session_id) = request.session_id {
            url.push_str(&format!("?session_id={session_id}"));
        }
        url
    }
}

#[derive(Serialize)]
struct ModeBody<'a> {
    user_prompt: &'a str,
    user_level: &'a str,
}

#[derive(Deserialize)]
struct WrappedResponse {
    response: String,
}

#[derive(Deserialize)]
struct ContentOnly {
    content: String,
}

/// Unwraps `{"response": ..}` or `{"content": ..}` envelopes; anything else
/// is the reply itself.
pub(crate) fn unwrap_reply(body: String) -> String {
    if let Ok(parsed) = serde_json::from_str::<WrappedResponse>(&body) {
        return parsed.response;
    }
    if let Ok(parsed) = serde_json::from_str::<ContentOnly>(&body) {
        return parsed.content;
    }
    body
}

#[async_trait]
impl DataSource for LiveSource {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn respond(&self, request: &ModeRequest) -> AppResult<String> {
        let url = self.endpoint(request);
        tracing::debug!(%url, level = request.level.slug(), "calling mode endpoint");

        let mut builder = self.client.post(&url).json(&ModeBody {
            user_prompt: &request.prompt,
            user_level: request.level.slug(),
        });
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(unwrap_reply(body))
        } else {
            Err(AppError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}
