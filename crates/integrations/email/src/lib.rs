//! Email service for Herald.
//!
//! Messages are built with `lettre` and delivered through an
//! [`EmailBackend`], SMTP by default. Each recipient receives its own
//! message.
//!
//! ```rust,no_run
//! use herald_email::{EmailConfig, EmailService};
//!
//! let config = EmailConfig::new("smtp.example.com", "alerts@example.com")
//!     .with_credentials("alerts", "secret")
//!     .with_recipients(["oncall@example.com"]);
//! let service = EmailService::new(config).unwrap();
//! ```

pub mod backend;
pub mod config;
pub mod error;
mod message;
pub mod service;
pub mod smtp;

pub use backend::EmailBackend;
pub use config::{BodyMode, EmailConfig, SmtpConfig};
pub use error::EmailError;
pub use service::{EmailExtra, EmailService, parse_mode, sender_name};
pub use smtp::SmtpBackend;
