use async_trait::async_trait;
use lettre::Message;

use crate::error::EmailError;

/// Transport that hands a finished message to a mail server.
///
/// [`SmtpBackend`](crate::smtp::SmtpBackend) is the production
/// implementation. Tests and hosts with their own relay can supply another.
#[async_trait]
pub trait EmailBackend: Send + Sync + std::fmt::Debug {
    async fn send(&self, message: Message) -> Result<(), EmailError>;

    /// Return the backend name (e.g. `"smtp"`).
    fn backend_name(&self) -> &'static str;
}
