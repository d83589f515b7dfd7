//! Slack service for Herald.
//!
//! Posts to a list of channel IDs through the Slack Web API. Attachments are
//! uploaded with the external upload flow (`files.getUploadURLExternal`,
//! upload, `files.completeUploadExternal`).

pub mod config;
pub mod error;
pub mod service;
pub mod types;

pub use config::SlackConfig;
pub use error::SlackError;
pub use service::{SlackExtra, SlackService, escape_message};
