pub mod chat;
pub mod config;
pub mod error;
pub mod modes;
pub mod render;
pub mod retry;
pub mod store;
pub mod types;

#[cfg(feature = "ui")]
pub mod ui;
#[cfg(feature = "ui")]
pub mod views;
