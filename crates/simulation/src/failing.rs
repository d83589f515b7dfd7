//! Service that simulates whole-service failure scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use herald_core::{ContextError, SendContext, SendOption};
use herald_service::{DeliveryError, NotifyError, RecipientFailure, SendError, Service};

/// A service whose every send fails in a fixed way, without going through
/// recipient fan-out.
///
/// Useful for testing dispatcher error attribution.
#[derive(Debug)]
pub struct FailingService {
    name: String,
    failure: FailureType,
    call_count: AtomicUsize,
    fail_until: Option<usize>,
    delay: Option<Duration>,
}

/// Kind of failure to simulate.
#[derive(Debug, Clone)]
pub enum FailureType {
    /// No recipients configured.
    NoRecipients,
    /// Settings were rejected.
    Configuration(String),
    /// A single recipient failed with the given cause.
    Delivery {
        recipient: String,
        cause: DeliveryError,
    },
    /// The send was cut short by the context. Waits for the context to be
    /// done first, so it behaves like a backend that honors cancellation.
    Context,
}

impl FailingService {
    pub fn new(name: impl Into<String>, failure: FailureType) -> Self {
        Self {
            name: name.into(),
            failure,
            call_count: AtomicUsize::new(0),
            fail_until: None,
            delay: None,
        }
    }

    pub fn no_recipients(name: impl Into<String>) -> Self {
        Self::new(name, FailureType::NoRecipients)
    }

    /// Fails for `recipient` as if the backend answered `status`.
    pub fn status(name: impl Into<String>, recipient: impl Into<String>, status: u16) -> Self {
        Self::new(
            name,
            FailureType::Delivery {
                recipient: recipient.into(),
                cause: DeliveryError::from_status(status, format!("simulated HTTP {status}")),
            },
        )
    }

    pub fn rate_limited(name: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self::status(name, recipient, 429)
    }

    pub fn waits_for_cancel(name: impl Into<String>) -> Self {
        Self::new(name, FailureType::Context)
    }

    /// Fail only the first `n` calls, then succeed.
    #[must_use]
    pub fn fail_until(mut self, n: usize) -> Self {
        self.fail_until = Some(n);
        self
    }

    /// Sleep before failing.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    fn make_error(&self) -> NotifyError {
        match &self.failure {
            FailureType::NoRecipients => NotifyError::NoRecipients,
            FailureType::Configuration(msg) => NotifyError::Configuration(msg.clone()),
            FailureType::Delivery { recipient, cause } => {
                let failure = RecipientFailure::new(recipient.clone(), cause.clone());
                SendError::from_failures(vec![failure])
                    .map_or(NotifyError::NoRecipients, NotifyError::Send)
            }
            FailureType::Context => NotifyError::Context(ContextError::Cancelled),
        }
    }
}

impl Service for FailingService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(
        &self,
        ctx: &SendContext,
        _subject: &str,
        _message: &str,
        _options: &[SendOption],
    ) -> Result<(), NotifyError> {
        let call_number = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(fail_until) = self.fail_until
            && call_number > fail_until
        {
            return Ok(());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let FailureType::Context = self.failure {
            return Err(ctx.done().await.into());
        }

        Err(self.make_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fails_every_call() {
        let service = FailingService::no_recipients("broken");
        for _ in 0..3 {
            let err = Service::send(&service, &SendContext::new(), "s", "m", &[])
                .await
                .unwrap_err();
            assert!(matches!(err, NotifyError::NoRecipients));
        }
        assert_eq!(service.call_count(), 3);
    }

    #[tokio::test]
    async fn recovers_after_fail_until() {
        let service = FailingService::rate_limited("flaky", "#ops").fail_until(2);
        let ctx = SendContext::new();
        assert!(Service::send(&service, &ctx, "s", "m", &[]).await.is_err());
        assert!(Service::send(&service, &ctx, "s", "m", &[]).await.is_err());
        assert!(Service::send(&service, &ctx, "s", "m", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn delivery_failure_names_recipient() {
        let service = FailingService::status("sms", "+15550001", 401);
        let err = Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap_err();
        let send = err.as_send_error().unwrap();
        assert_eq!(send.failed_recipients().collect::<Vec<_>>(), ["+15550001"]);
        assert!(matches!(send.errors().next(), Some(DeliveryError::Unauthorized(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn context_failure_waits_for_deadline() {
        let service = FailingService::waits_for_cancel("hang");
        let ctx = SendContext::new().with_timeout(Duration::from_secs(1));
        let err = Service::send(&service, &ctx, "s", "m", &[]).await.unwrap_err();
        assert_eq!(err.as_context_error(), Some(ContextError::DeadlineExceeded));
    }
}
