//! Recording service that captures every delivery for verification.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use herald_core::{SendContext, SendOption, render};
use herald_service::fanout::{self, Prepared};
use herald_service::{DeliveryError, NotifyError, Recipients, Service, ServiceSettings};
use parking_lot::Mutex;

type Hook = dyn Fn(&str) + Send + Sync;

/// One recipient handled by a [`RecordingService`].
#[derive(Debug, Clone)]
pub struct CapturedDelivery {
    pub timestamp: DateTime<Utc>,
    pub recipient: String,
    /// Rendered message text.
    pub message: String,
    pub attachments: Vec<String>,
    /// `false` when dry run skipped the transport call.
    pub sent: bool,
    /// The simulated outcome.
    pub result: Result<(), DeliveryError>,
}

/// A service that follows the standard recipient fan-out and records what
/// it would have delivered instead of contacting a backend.
///
/// Failures can be scripted per recipient, either as a [`DeliveryError`] or
/// as an HTTP status that goes through the usual normalization.
pub struct RecordingService {
    settings: ServiceSettings<()>,
    recipients: Recipients<String>,
    deliveries: Arc<Mutex<Vec<CapturedDelivery>>>,
    transport_calls: AtomicUsize,
    failures: HashMap<String, DeliveryError>,
    delay: Option<Duration>,
    before_send: Option<Arc<Hook>>,
}

impl std::fmt::Debug for RecordingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingService")
            .field("settings", &self.settings)
            .field("recipients", &self.recipients)
            .field("transport_calls", &self.transport_calls())
            .field("failures", &self.failures)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl RecordingService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            settings: ServiceSettings::new(name, (), render::subject_and_message),
            recipients: Recipients::default(),
            deliveries: Arc::new(Mutex::new(Vec::new())),
            transport_calls: AtomicUsize::new(0),
            failures: HashMap::new(),
            delay: None,
            before_send: None,
        }
    }

    #[must_use]
    pub fn with_recipients(self, recipients: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.add_recipients(recipients);
        self
    }

    pub fn add_recipients(&self, recipients: impl IntoIterator<Item = impl Into<String>>) {
        self.recipients.add(recipients.into_iter().map(Into::into));
    }

    /// Default for the dry-run flag.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.settings = self.settings.with_dry_run(dry_run);
        self
    }

    /// Default for the continue-on-error flag.
    #[must_use]
    pub fn with_continue_on_err(mut self, continue_on_err: bool) -> Self {
        self.settings = self.settings.with_continue_on_err(continue_on_err);
        self
    }

    /// Fail every delivery to `recipient` with `error`.
    #[must_use]
    pub fn with_failure(mut self, recipient: impl Into<String>, error: DeliveryError) -> Self {
        self.failures.insert(recipient.into(), error);
        self
    }

    /// Fail every delivery to `recipient` as if the backend answered `status`.
    #[must_use]
    pub fn with_status_failure(self, recipient: impl Into<String>, status: u16) -> Self {
        self.with_failure(
            recipient,
            DeliveryError::from_status(status, format!("simulated HTTP {status}")),
        )
    }

    /// Sleep before each transport call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Run `hook` with the recipient before each transport call.
    #[must_use]
    pub fn with_before_send<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.before_send = Some(Arc::new(hook));
        self
    }

    /// Every recipient handled so far, dry-run included.
    pub fn deliveries(&self) -> Vec<CapturedDelivery> {
        self.deliveries.lock().clone()
    }

    /// Recipients handled so far, in order.
    pub fn attempted_recipients(&self) -> Vec<String> {
        self.deliveries
            .lock()
            .iter()
            .map(|d| d.recipient.clone())
            .collect()
    }

    /// Number of simulated transport calls. Dry-run deliveries are not counted.
    pub fn transport_calls(&self) -> usize {
        self.transport_calls.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.deliveries.lock().clear();
        self.transport_calls.store(0, Ordering::SeqCst);
    }

    /// Assert that exactly `n` transport calls were made.
    ///
    /// # Panics
    ///
    /// Panics if the count differs.
    pub fn assert_transport_calls(&self, n: usize) {
        let count = self.transport_calls();
        assert_eq!(
            count,
            n,
            "expected {n} transport calls on service '{}', got {count}",
            self.settings.name()
        );
    }

    /// Assert that no transport call was made.
    ///
    /// # Panics
    ///
    /// Panics if any transport call was made.
    pub fn assert_not_called(&self) {
        self.assert_transport_calls(0);
    }

    async fn deliver_one(
        &self,
        recipient: &str,
        message: &str,
        attachments: Vec<String>,
        dry_run: bool,
    ) -> Result<(), DeliveryError> {
        let result = if dry_run {
            fanout::log_dry_run(self.settings.name(), &recipient, "recorded delivery");
            Ok(())
        } else {
            if let Some(hook) = &self.before_send {
                hook(recipient);
            }
            self.transport_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.failures.get(recipient) {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        };

        self.deliveries.lock().push(CapturedDelivery {
            timestamp: Utc::now(),
            recipient: recipient.to_owned(),
            message: message.to_owned(),
            attachments,
            sent: !dry_run,
            result: result.clone(),
        });
        result
    }
}

impl Service for RecordingService {
    fn name(&self) -> &str {
        self.settings.name()
    }

    async fn send(
        &self,
        ctx: &SendContext,
        subject: &str,
        message: &str,
        options: &[SendOption],
    ) -> Result<(), NotifyError> {
        let recipients = self.recipients.snapshot();
        let prepared = fanout::prepare(&self.settings, &recipients, subject, message, options)?;
        let config = match prepared {
            Prepared::Skip => return Ok(()),
            Prepared::Ready(config) => config,
        };
        let config = &config;

        fanout::deliver(
            ctx,
            self.settings.name(),
            &recipients,
            config.continue_on_err,
            |recipient| async move {
                let attachments = config
                    .attachments
                    .iter()
                    .map(|a| a.name().to_owned())
                    .collect();
                self.deliver_one(&recipient, &config.message, attachments, config.dry_run)
                    .await
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use herald_core::{Attachment, with_attachments, with_dry_run};

    use super::*;

    #[tokio::test]
    async fn records_rendered_message_per_recipient() {
        let service = RecordingService::new("rec").with_recipients(["a", "b"]);
        let file = Attachment::from_bytes(&b"1"[..], "one.txt", "text/plain", false);
        Service::send(&service, &SendContext::new(), "Subj", "Body", &[with_attachments([file])])
            .await
            .unwrap();

        service.assert_transport_calls(2);
        let deliveries = service.deliveries();
        assert_eq!(deliveries[0].recipient, "a");
        assert_eq!(deliveries[0].message, "Subj\n\nBody");
        assert_eq!(deliveries[1].attachments, ["one.txt"]);
        assert!(deliveries.iter().all(|d| d.sent));
    }

    #[tokio::test]
    async fn dry_run_records_without_transport() {
        let service = RecordingService::new("rec").with_recipients(["a"]);
        Service::send(&service, &SendContext::new(), "s", "m", &[with_dry_run(true)])
            .await
            .unwrap();
        service.assert_not_called();
        assert_eq!(service.attempted_recipients(), ["a"]);
        assert!(!service.deliveries()[0].sent);
    }

    #[tokio::test]
    async fn status_failures_are_normalized() {
        let service = RecordingService::new("rec")
            .with_recipients(["a"])
            .with_status_failure("a", 503);
        let err = Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap_err();
        let send = err.as_send_error().unwrap();
        assert!(matches!(send.cause_for("a"), Some(DeliveryError::ExternalServer(_))));
    }

    #[tokio::test]
    async fn clear_resets_history() {
        let service = RecordingService::new("rec").with_recipients(["a"]);
        Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap();
        service.clear();
        service.assert_not_called();
        assert!(service.deliveries().is_empty());
    }
}
