//! Twilio SMS service for Herald.
//!
//! Sends the rendered message as an SMS to every configured number through
//! the [Twilio REST API](https://www.twilio.com/docs/sms/api/message-resource).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use herald_twilio::{TwilioConfig, TwilioService};
//!
//! let config = TwilioConfig::new("ACXXXXXXXX", "auth_token")
//!     .with_from_number("+15551234567")
//!     .with_phone_numbers(["+15559876543"]);
//! let service = TwilioService::new(config);
//! ```

pub mod config;
pub mod error;
pub mod service;
pub mod types;

pub use config::TwilioConfig;
pub use error::TwilioError;
pub use service::TwilioService;
