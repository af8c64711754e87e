use super::Store;
use crate::error::{AppError, AppResult};
use crate::retry::{RetryPolicy, retry};
use crate::types::{ChatMessage, Estimate, MessageRow, NewEstimate, PartDetail, Session};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Store backed by the hosted REST backend.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    user_id: Option<String>,
    retry: RetryPolicy,
}

/// Wire shape of the `estimates` table.
#[derive(Debug, Serialize, Deserialize)]
struct EstimateRow {
    #[serde(default)]
    id: Option<i64>,
    purpose: String,
    total_price: String,
    #[serde(default)]
    metrics_score_json: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    compatibility_json: EstimateBody,
    #[serde(default)]
    overall_reason: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EstimateBody {
    #[serde(default)]
    parts: BTreeMap<String, PartDetail>,
    #[serde(default)]
    suggestion: Option<String>,
    #[serde(default)]
    session_id: Option<i64>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes a list of estimate rows, skipping rows that cannot be read.
fn decode_estimate_rows(rows: Vec<Value>) -> Vec<Estimate> {
    rows.into_iter()
        .filter_map(|raw| {
            let decoded = serde_json::from_value::<EstimateRow>(raw)
                .map_err(AppError::from)
                .and_then(EstimateRow::into_estimate);
            match decoded {
                Ok(estimate) => Some(estimate),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable estimate row");
                    None
                }
            }
        })
        .collect()
}

impl EstimateRow {
    fn from_new(estimate: NewEstimate) -> Self {
        Self {
            id: None,
            purpose: estimate.title,
            total_price: estimate.total_price,
            metrics_score_json: None,
            compatibility_json: EstimateBody {
                parts: estimate.parts,
                suggestion: estimate.suggestion,
                session_id: estimate.session_id,
            },
            overall_reason: estimate.total_reason,
            created_at: None,
            user_id: estimate.user_id,
        }
    }

    fn into_estimate(self) -> AppResult<Estimate> {
        let id = self
            .id
            .ok_or_else(|| AppError::Decode("estimate row without id".into()))?;
        Ok(Estimate {
            id,
            session_id: self.compatibility_json.session_id,
            title: self.purpose,
            parts: self.compatibility_json.parts,
            total_price: self.total_price,
            total_reason: self.overall_reason,
            suggestion: self.compatibility_json.suggestion,
            created_at: self.created_at.unwrap_or_else(OffsetDateTime::now_utc),
            user_id: self.user_id,
            metrics: self.metrics_score_json,
        })
    }
}

#[derive(Serialize)]
struct NewSession<'a> {
    session_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            user_id: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    /// Sends a request built by `build` (rebuilt on every attempt) and decodes the JSON reply.
    async fn fetch<T, F>(&self, label: &str, build: F) -> AppResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let build = &build;
        retry(&self.retry, label, || async move {
            let response = build().send().await?;
            let status = response.status();
            let body = response.text().await?;
            if status == StatusCode::NOT_FOUND {
                return Err(AppError::not_found(label.to_string()));
            }
            if !status.is_success() {
                return Err(AppError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(serde_json::from_str::<T>(&body)?)
        })
        .await
    }

    /// Sends a delete; a missing row counts as already deleted.
    async fn delete(&self, label: &str, path: &str) -> AppResult<()> {
        retry(&self.retry, label, || async move {
            let response = self.request(Method::DELETE, path).send().await?;
            let status = response.status();
            if status.is_success() || status == StatusCode::NOT_FOUND {
                return Ok(());
            }
            let body = response.text().await.unwrap_or_default();
            Err(AppError::Status {
                status: status.as_u16(),
                body,
            })
        })
        .await
    }
}

#[async_trait]
impl Store for RestStore {
    async fn create_session(&self, name: &str) -> AppResult<Session> {
        let body = NewSession {
            session_name: name,
            user_id: self.user_id.as_deref(),
        };
        self.fetch("create session", || {
            self.request(Method::POST, "sessions").json(&body)
        })
        .await
    }

    async fn list_sessions(&self) -> AppResult<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .fetch("list sessions", || self.request(Method::GET, "sessions"))
            .await?;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }

    async fn delete_session(&self, id: i64) -> AppResult<()> {
        self.delete("delete session", &format!("sessions/{id}")).await
    }

    async fn delete_messages(&self, session_id: i64) -> AppResult<()> {
        self.delete("delete messages", &format!("{session_id}/messages"))
            .await
    }

    async fn insert_message(&self, session_id: i64, message: &ChatMessage) -> AppResult<MessageRow> {
        let row = MessageRow::from_message(0, session_id, message);
        let path = format!("{session_id}/messages");
        self.fetch("insert message", || {
            self.request(Method::POST, &path).json(&row)
        })
        .await
    }

    async fn list_messages(&self, session_id: i64) -> AppResult<Vec<MessageRow>> {
        let path = format!("{session_id}/messages");
        let mut rows: Vec<MessageRow> = self
            .fetch("list messages", || self.request(Method::GET, &path))
            .await?;
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn list_estimates(&self) -> AppResult<Vec<Estimate>> {
        let rows: Vec<Value> = self
            .fetch("list estimates", || self.request(Method::GET, "estimates"))
            .await?;
        let mut estimates = decode_estimate_rows(rows);
        estimates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(estimates)
    }

    async fn get_estimate(&self, id: i64) -> AppResult<Estimate> {
        let path = format!("estimates/{id}");
        let row: EstimateRow = self
            .fetch("get estimate", || self.request(Method::GET, &path))
            .await?;
        row.into_estimate()
    }

    async fn save_estimate(&self, mut estimate: NewEstimate) -> AppResult<Estimate> {
        if estimate.user_id.is_none() {
            estimate.user_id = self.user_id.clone();
        }
        // Unattached estimates are saved under session 0.
        let path = format!("estimates/{}/save", estimate.session_id.unwrap_or(0));
        let row = EstimateRow::from_new(estimate);
        let saved: EstimateRow = self
            .fetch("save estimate", || self.request(Method::POST, &path).json(&row))
            .await?;
        saved.into_estimate()
    }

    async fn delete_estimate(&self, id: i64) -> AppResult<()> {
        self.delete("delete estimate", &format!("estimates/{id}"))
            .await
    }
}
