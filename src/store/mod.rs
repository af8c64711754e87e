//! Persistence for sessions, messages and estimates
//!
//! - `MemoryStore` - in-process tables, used by tests and wasm builds
//! - `FileStore` - the same tables flushed to a JSON document
//! - `RestStore` - the hosted backend, with retry on transient failures
mod file;
mod memory;
mod rest;
mod tables;

pub use file::{FileStore, default_store_path};
pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::error::AppResult;
use crate::types::{ChatMessage, Estimate, MessageRow, NewEstimate, Session};
use async_trait::async_trait;

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_session(&self, name: &str) -> AppResult<Session>;

    /// Newest first.
    async fn list_sessions(&self) -> AppResult<Vec<Session>>;

    /// Deleting a missing session is not an error.
    async fn delete_session(&self, id: i64) -> AppResult<()>;

    async fn delete_messages(&self, session_id: i64) -> AppResult<()>;

    async fn insert_message(&self, session_id: i64, message: &ChatMessage) -> AppResult<MessageRow>;

    /// Creation order.
    async fn list_messages(&self, session_id: i64) -> AppResult<Vec<MessageRow>>;

    /// Newest first.
    async fn list_estimates(&self) -> AppResult<Vec<Estimate>>;

    async fn get_estimate(&self, id: i64) -> AppResult<Estimate>;

    async fn save_estimate(&self, estimate: NewEstimate) -> AppResult<Estimate>;

    /// Deleting a missing estimate is not an error.
    async fn delete_estimate(&self, id: i64) -> AppResult<()>;
}
