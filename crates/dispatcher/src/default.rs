//! A process-wide [`Dispatcher`] for callers that do not want to thread one
//! through their code.
//!
//! The default instance is created on first use. [`set_default`] swaps it
//! out; sends already in flight keep using the instance they started with.

use std::sync::{Arc, LazyLock};

use herald_core::{SendContext, SendOption};
use herald_service::DynService;
use parking_lot::RwLock;

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;

static DEFAULT: LazyLock<RwLock<Arc<Dispatcher>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Dispatcher::new())));

/// The current process-wide dispatcher.
pub fn default_dispatcher() -> Arc<Dispatcher> {
    Arc::clone(&DEFAULT.read())
}

/// Replace the process-wide dispatcher.
pub fn set_default(dispatcher: Dispatcher) {
    *DEFAULT.write() = Arc::new(dispatcher);
}

/// Register services on the process-wide dispatcher.
pub fn use_services(services: impl IntoIterator<Item = Arc<dyn DynService>>) {
    default_dispatcher().use_services(services);
}

/// Send through the process-wide dispatcher.
///
/// # Errors
///
/// See [`Dispatcher::send`].
pub async fn send(
    ctx: &SendContext,
    subject: &str,
    message: &str,
    options: &[SendOption],
) -> Result<(), DispatchError> {
    let dispatcher = default_dispatcher();
    dispatcher.send(ctx, subject, message, options).await
}
