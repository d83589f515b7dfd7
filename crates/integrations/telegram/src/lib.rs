//! Telegram service for Herald.
//!
//! Delivers to chat IDs through the Bot API: `sendMessage` for text and
//! `sendDocument` for attachments.

pub mod config;
pub mod error;
pub mod service;
pub mod types;

pub use config::{ParseMode, TelegramConfig};
pub use error::TelegramError;
pub use service::{TelegramExtra, TelegramService, parse_mode};
