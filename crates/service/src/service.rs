use async_trait::async_trait;
use herald_core::{SendContext, SendOption};

use crate::error::NotifyError;

/// A notification backend: something that can deliver a subject and message
/// to the recipients it was configured with.
///
/// This trait is **not** object-safe because it uses native `async fn` methods.
/// For dynamic dispatch use [`DynService`] instead -- every `Service`
/// automatically implements `DynService` via a blanket implementation.
///
/// Implementations own their recipient list and must be safe to call from
/// many tasks at once. A single `send` call returns only after every
/// recipient has been attempted (or the first failure, when
/// continue-on-error is off), so callers can await completion.
pub trait Service: Send + Sync {
    /// Short identifier used in logs and error attribution.
    fn name(&self) -> &str;

    /// Deliver `subject` and `message` to every configured recipient.
    ///
    /// `options` are applied on top of the service's defaults; options aimed
    /// at other services' extensions are ignored.
    fn send(
        &self,
        ctx: &SendContext,
        subject: &str,
        message: &str,
        options: &[SendOption],
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

/// Object-safe service trait for use behind `Arc<dyn DynService>`.
///
/// You generally should not implement this trait directly -- implement
/// [`Service`] and rely on the blanket implementation.
#[async_trait]
pub trait DynService: Send + Sync {
    fn name(&self) -> &str;

    async fn send(
        &self,
        ctx: &SendContext,
        subject: &str,
        message: &str,
        options: &[SendOption],
    ) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: Service + Sync> DynService for T {
    fn name(&self) -> &str {
        Service::name(self)
    }

    async fn send(
        &self,
        ctx: &SendContext,
        subject: &str,
        message: &str,
        options: &[SendOption],
    ) -> Result<(), NotifyError> {
        Service::send(self, ctx, subject, message, options).await
    }
}
