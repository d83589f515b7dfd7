//! Core value types shared by every Herald crate.
//!
//! - [`Attachment`]: immutable, reusable file payloads
//! - [`SendConfig`] and [`SendOption`]: the per-call configuration that each
//!   service builds from its defaults plus caller options
//! - [`SendContext`]: cancellation and deadline scope for a send call

pub mod attachment;
pub mod config;
pub mod context;
pub mod render;

pub use attachment::{Attachment, AttachmentError};
pub use config::{
    CustomOption, Metadata, Renderer, SendConfig, SendOption, with_attachments,
    with_continue_on_err, with_dry_run, with_metadata,
};
pub use context::{ContextError, SendContext};
