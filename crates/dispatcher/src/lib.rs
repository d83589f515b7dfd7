//! Cross-service notification dispatch.
//!
//! A [`Dispatcher`] holds an ordered list of services and sends each
//! notification through all of them concurrently. Failures are collected per
//! service and returned together as a [`DispatchError`].
//!
//! The [`default`] module exposes the same operations on a lazily created
//! process-wide instance.

pub mod builder;
pub mod default;
pub mod dispatcher;
pub mod error;

pub use builder::DispatcherBuilder;
pub use default::{default_dispatcher, send, set_default, use_services};
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, ServiceFailure};
