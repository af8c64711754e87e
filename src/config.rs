use crate::chat::ChatService;
use crate::error::AppResult;
use crate::modes::{DataSource, LiveSource, ModeRegistry, SampleSource};
use crate::retry::RetryPolicy;
use crate::store::{FileStore, MemoryStore, RestStore, Store};
use crate::types::ExpertiseLevel;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSourceKind {
    Live,
    Sample,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Rest,
    File,
    Memory,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub data_source: DataSourceKind,
    pub store: StoreKind,
    pub store_url: Option<String>,
    pub store_path: Option<PathBuf>,
    pub user_id: Option<String>,
    pub default_level: ExpertiseLevel,
    pub retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = get("BUILDWISE_API_URL");
        let store_url = get("BUILDWISE_STORE_URL");

        let data_source = match get("BUILDWISE_DATA_SOURCE")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("sample") => DataSourceKind::Sample,
            Some("live") if api_url.is_some() => DataSourceKind::Live,
            Some("live") => {
                tracing::warn!("BUILDWISE_DATA_SOURCE=live but BUILDWISE_API_URL is unset, using sample data");
                DataSourceKind::Sample
            }
            Some(other) => {
                tracing::warn!(value = other, "unknown BUILDWISE_DATA_SOURCE, ignoring");
                default_source(&api_url)
            }
            None => default_source(&api_url),
        };

        let store = match get("BUILDWISE_STORE")
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("memory") => StoreKind::Memory,
            Some("file") => StoreKind::File,
            Some("rest") if store_url.is_some() => StoreKind::Rest,
            Some("rest") => {
                tracing::warn!("BUILDWISE_STORE=rest but BUILDWISE_STORE_URL is unset, using the local file store");
                local_store()
            }
            Some(other) => {
                tracing::warn!(value = other, "unknown BUILDWISE_STORE, ignoring");
                default_store(&store_url)
            }
            None => default_store(&store_url),
        };

        let default_level = get("BUILDWISE_LEVEL")
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_or(get("BUILDWISE_RETRY_ATTEMPTS"), defaults.max_attempts).clamp(1, 10),
            base_delay: Duration::from_millis(
                parse_or(get("BUILDWISE_RETRY_BASE_MS"), defaults.base_delay.as_millis() as u64)
                    .min(60_000),
            ),
            factor: parse_or(get("BUILDWISE_RETRY_FACTOR"), defaults.factor).clamp(1.0, 10.0),
            max_delay: Duration::from_millis(
                parse_or(get("BUILDWISE_RETRY_MAX_MS"), defaults.max_delay.as_millis() as u64)
                    .min(300_000),
            ),
        };

        Self {
            api_url,
            api_key: get("BUILDWISE_API_KEY"),
            data_source,
            store,
            store_url,
            store_path: get("BUILDWISE_STORE_PATH").map(PathBuf::from),
            user_id: get("BUILDWISE_USER_ID"),
            default_level,
            retry,
        }
    }

    pub fn data_source(&self) -> Arc<dyn DataSource> {
        match (self.data_source, &self.api_url) {
            (DataSourceKind::Live, Some(url)) => Arc::new(LiveSource::new(url, self.api_key.clone())),
            _ => Arc::new(SampleSource),
        }
    }

    pub fn open_store(&self) -> AppResult<Arc<dyn Store>> {
        match (self.store, &self.store_url) {
            (StoreKind::Rest, Some(url)) => Ok(Arc::new(
                RestStore::new(url, self.api_key.clone())
                    .with_user(self.user_id.clone())
                    .with_retry(self.retry),
            )),
            (StoreKind::Memory, _) => Ok(Arc::new(match &self.user_id {
                Some(user) => MemoryStore::for_user(user.clone()),
                None => MemoryStore::new(),
            })),
            _ => {
                let store = match &self.store_path {
                    Some(path) => FileStore::open(path, self.user_id.clone())?,
                    None => FileStore::open_default(self.user_id.clone())?,
                };
                Ok(Arc::new(store))
            }
        }
    }

    /// Wires the chat service. A store that cannot be opened degrades to memory.
    pub fn build_service(&self) -> ChatService {
        let store = self.open_store().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "could not open store, keeping data in memory");
            Arc::new(MemoryStore::new())
        });
        let registry = ModeRegistry::new(self.data_source());
        tracing::info!(
            source = registry.source_name(),
            store = ?self.store,
            "chat service ready"
        );
        ChatService::new(store, registry)
    }
}

fn default_source(api_url: &Option<String>) -> DataSourceKind {
    if api_url.is_some() {
        DataSourceKind::Live
    } else {
        DataSourceKind::Sample
    }
}

fn default_store(store_url: &Option<String>) -> StoreKind {
    if store_url.is_some() {
        StoreKind::Rest
    } else {
        local_store()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn local_store() -> StoreKind {
    StoreKind::File
}

#[cfg(target_arch = "wasm32")]
fn local_store() -> StoreKind {
    StoreKind::Memory
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_env() {
        let cfg = config(&[]);
        assert_eq!(cfg.data_source, DataSourceKind::Sample);
        assert_eq!(cfg.store, StoreKind::File);
        assert_eq!(cfg.default_level, ExpertiseLevel::Beginner);
        assert_eq!(cfg.retry, RetryPolicy::default());
    }

    #[test]
    fn test_urls_select_live_and_rest() {
        let cfg = config(&[
            ("BUILDWISE_API_URL", "https://api.example.com"),
            ("BUILDWISE_STORE_URL", "https://store.example.com"),
        ]);
        assert_eq!(cfg.data_source, DataSourceKind::Live);
        assert_eq!(cfg.store, StoreKind::Rest);
    }

    #[test]
    fn test_live_without_url_degrades_to_sample() {
        let cfg = config(&[("BUILDWISE_DATA_SOURCE", "live"), ("BUILDWISE_STORE", "rest")]);
        assert_eq!(cfg.data_source, DataSourceKind::Sample);
        assert_eq!(cfg.store, StoreKind::File);
    }

    #[test]
    fn test_explicit_sample_wins_over_url() {
        let cfg = config(&[
            ("BUILDWISE_API_URL", "https://api.example.com"),
            ("BUILDWISE_DATA_SOURCE", "Sample"),
            ("BUILDWISE_STORE", "memory"),
        ]);
        assert_eq!(cfg.data_source, DataSourceKind::Sample);
        assert_eq!(cfg.store, StoreKind::Memory);
        assert_eq!(cfg.data_source().name(), "sample");
    }

    #[test]
    fn test_retry_and_level_parsing() {
        let cfg = config(&[
            ("BUILDWISE_RETRY_ATTEMPTS", "5"),
            ("BUILDWISE_RETRY_BASE_MS", "200"),
            ("BUILDWISE_RETRY_FACTOR", "not-a-number"),
            ("BUILDWISE_LEVEL", "expert"),
            ("BUILDWISE_USER_ID", "  "),
        ]);
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.base_delay, Duration::from_millis(200));
        assert_eq!(cfg.retry.factor, 1.5);
        assert_eq!(cfg.default_level, ExpertiseLevel::Expert);
        assert!(cfg.user_id.is_none());
    }

    #[tokio::test]
    async fn test_memory_service_round_trip() {
        let service = config(&[("BUILDWISE_STORE", "memory")]).build_service();
        assert_eq!(service.source_name(), "sample");
        let session = service.create_session(None).await.unwrap();
        assert_eq!(session.name, crate::chat::DEFAULT_SESSION_NAME);
    }
}
