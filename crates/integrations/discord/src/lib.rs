//! Discord service for Herald.
//!
//! Three authentication modes are supported. With a bot or bearer token the
//! recipients are channel IDs and messages go to
//! `POST /channels/{id}/messages`. In webhook mode each recipient is a full
//! webhook URL. Attachments are sent as `multipart/form-data` with the
//! message in a `payload_json` part.

pub mod config;
pub mod error;
pub mod service;
pub mod types;

pub use config::{AuthMode, DiscordConfig};
pub use error::DiscordError;
pub use service::{DiscordExtra, DiscordService, avatar_url, username};
