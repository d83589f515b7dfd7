//! [ntfy](https://ntfy.sh) service for Herald.
//!
//! Recipients are topic names. Works against `ntfy.sh` or a self-hosted
//! server via [`NtfyConfig::api_base_url`].

pub mod config;
pub mod error;
pub mod service;
pub mod types;

pub use config::{NtfyConfig, ParseMode, Priority};
pub use error::NtfyError;
pub use service::{
    NtfyExtra, NtfyService, click_action, delay, icon, parse_mode, priority, tags,
};
