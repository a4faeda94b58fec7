//! Telegram gateway
//!
//! Everything that touches the platform: wire types, the Bot API client,
//! and the two update-ingestion modes (long polling and webhook push).

pub mod api;
pub mod polling;
pub mod types;
pub mod webhook;

pub use api::{ApiError, Gateway, TelegramApi};
