//! The service abstraction and the recipient fan-out shared by every backend.

pub mod error;
pub mod fanout;
pub mod log;
pub mod service;
pub mod settings;

#[cfg(feature = "http")]
pub mod http;

pub use error::{DeliveryError, NotifyError, RecipientFailure, SendError};
pub use fanout::Prepared;
pub use log::LogService;
pub use service::{DynService, Service};
pub use settings::{Recipients, ServiceSettings};
