//! Generic HTTP webhook service for Herald.
//!
//! Every recipient is a [`Webhook`]: a URL plus the method, content type and
//! headers to call it with. The default body is a JSON object holding the
//! subject and message; swap it with [`WebhookService::with_renderer`].
//! Pre-send hooks can sign or rewrite each request and post-send hooks see
//! every response.

pub mod config;
pub mod error;
pub mod service;

pub use config::{HttpMethod, Webhook, WebhookConfig};
pub use error::{HookError, WebhookError};
pub use service::{WebhookExtra, WebhookService, header, json_payload};
