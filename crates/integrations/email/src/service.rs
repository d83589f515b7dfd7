use std::sync::Arc;

use herald_core::{SendConfig, SendContext, SendOption, render};
use herald_service::fanout::{self, Prepared};
use herald_service::{DeliveryError, NotifyError, Recipients, Service, ServiceSettings};
use tracing::{debug, instrument};

use crate::backend::EmailBackend;
use crate::config::{BodyMode, EmailConfig};
use crate::error::EmailError;
use crate::message::{self, Addresses};
use crate::smtp::SmtpBackend;

/// Email-specific send settings.
#[derive(Debug, Clone, Default)]
pub struct EmailExtra {
    pub body_mode: BodyMode,
    pub sender_name: Option<String>,
}

/// Per-call override of [`EmailConfig::body_mode`].
pub fn parse_mode(mode: BodyMode) -> SendOption {
    SendOption::custom(move |extra: &mut EmailExtra| extra.body_mode = mode)
}

/// Per-call override of [`EmailConfig::sender_name`].
pub fn sender_name(name: impl Into<String>) -> SendOption {
    let name = name.into();
    SendOption::custom(move |extra: &mut EmailExtra| extra.sender_name = Some(name.clone()))
}

/// Email service. Every recipient gets a separate message so failures are
/// attributed per address.
pub struct EmailService {
    from_address: String,
    settings: ServiceSettings<EmailExtra>,
    recipients: Recipients<String>,
    cc: Recipients<String>,
    bcc: Recipients<String>,
    backend: Arc<dyn EmailBackend>,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("from_address", &self.from_address)
            .field("settings", &self.settings)
            .field("recipients", &self.recipients.len())
            .field("cc", &self.cc.len())
            .field("bcc", &self.bcc.len())
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl EmailService {
    /// Create an SMTP-backed email service.
    ///
    /// # Errors
    ///
    /// Fails if the sender address is invalid or the SMTP transport cannot be
    /// configured.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let backend = SmtpBackend::new(config.smtp.clone())?;
        Self::with_backend(config, backend)
    }

    /// Create an email service that delivers through `backend`.
    ///
    /// # Errors
    ///
    /// Fails if the sender address is invalid.
    pub fn with_backend(
        config: EmailConfig,
        backend: impl EmailBackend + 'static,
    ) -> Result<Self, EmailError> {
        message::parse_mailbox(&config.from_address)?;
        let extra = EmailExtra {
            body_mode: config.body_mode,
            sender_name: config.sender_name,
        };
        let settings = ServiceSettings::new(config.name, extra, render::message_only)
            .with_dry_run(config.dry_run)
            .with_continue_on_err(config.continue_on_err);
        Ok(Self {
            from_address: config.from_address,
            settings,
            recipients: Recipients::new(config.recipients),
            cc: Recipients::new(config.cc),
            bcc: Recipients::new(config.bcc),
            backend: Arc::new(backend),
        })
    }

    #[must_use]
    pub fn with_renderer(
        mut self,
        renderer: impl Fn(&SendConfig<EmailExtra>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.settings = self.settings.with_renderer(renderer);
        self
    }

    pub fn add_recipients(&self, addresses: impl IntoIterator<Item = impl Into<String>>) {
        self.recipients.add(addresses.into_iter().map(Into::into));
    }

    pub fn add_cc_recipients(&self, addresses: impl IntoIterator<Item = impl Into<String>>) {
        self.cc.add(addresses.into_iter().map(Into::into));
    }

    pub fn add_bcc_recipients(&self, addresses: impl IntoIterator<Item = impl Into<String>>) {
        self.bcc.add(addresses.into_iter().map(Into::into));
    }

    async fn send_to(
        &self,
        addresses: &Addresses,
        recipient: &str,
        config: &SendConfig<EmailExtra>,
    ) -> Result<(), EmailError> {
        let to = message::parse_mailbox(recipient)?;
        let email = message::build(
            addresses,
            to,
            &config.subject,
            &config.message,
            config.extra.body_mode,
            &config.attachments,
        )?;
        if config.dry_run {
            fanout::log_dry_run(self.settings.name(), &recipient, "email");
            return Ok(());
        }
        debug!(recipient, backend = self.backend.backend_name(), "sending email");
        self.backend.send(email).await
    }
}

impl Service for EmailService {
    fn name(&self) -> &str {
        self.settings.name()
    }

    #[instrument(skip_all, fields(service = %self.settings.name()))]
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
        let addresses = Addresses::parse(
            &self.from_address,
            config.extra.sender_name.as_deref(),
            &self.cc.snapshot(),
            &self.bcc.snapshot(),
        )?;
        let (config, addresses) = (&config, &addresses);

        fanout::deliver(
            ctx,
            self.settings.name(),
            &recipients,
            config.continue_on_err,
            |recipient| async move {
                self.send_to(addresses, &recipient, config)
                    .await
                    .map_err(DeliveryError::from)
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use herald_core::{Attachment, with_attachments, with_continue_on_err, with_dry_run};
    use lettre::Message;
    use parking_lot::Mutex;

    use super::*;

    /// Backend that records messages and rejects one address.
    #[derive(Debug, Default, Clone)]
    struct RecordingBackend {
        sent: Arc<Mutex<Vec<Message>>>,
        reject: Option<String>,
    }

    impl RecordingBackend {
        fn rejecting(address: &str) -> Self {
            Self {
                reject: Some(address.to_owned()),
                ..Self::default()
            }
        }

        fn raw(&self) -> Vec<String> {
            self.sent
                .lock()
                .iter()
                .map(|m| String::from_utf8(m.formatted()).unwrap())
                .collect()
        }
    }

    #[async_trait]
    impl EmailBackend for RecordingBackend {
        async fn send(&self, message: Message) -> Result<(), EmailError> {
            let to = message.envelope().to().first().map(ToString::to_string);
            if to.is_some() && to == self.reject {
                return Err(EmailError::Configuration("mailbox unavailable".into()));
            }
            self.sent.lock().push(message);
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "recording"
        }
    }

    fn config(recipients: &[&str]) -> EmailConfig {
        EmailConfig::new("localhost", "alerts@example.com")
            .with_recipients(recipients.iter().copied())
    }

    #[tokio::test]
    async fn sends_one_message_per_recipient() {
        let backend = RecordingBackend::default();
        let service =
            EmailService::with_backend(config(&["a@example.com", "b@example.com"]), backend.clone())
                .unwrap();

        Service::send(&service, &SendContext::new(), "Deploy", "<p>done</p>", &[])
            .await
            .unwrap();

        let raw = backend.raw();
        assert_eq!(raw.len(), 2);
        assert!(raw[0].contains("To: a@example.com"));
        assert!(raw[1].contains("To: b@example.com"));
        assert!(raw.iter().all(|m| m.contains("Subject: Deploy")));
        assert!(raw[0].contains("text/html"));
        assert!(!raw[0].contains("Deploy\n\n"));
    }

    #[tokio::test]
    async fn options_override_body_mode_and_sender() {
        let backend = RecordingBackend::default();
        let service =
            EmailService::with_backend(config(&["a@example.com"]), backend.clone()).unwrap();

        Service::send(
            &service,
            &SendContext::new(),
            "s",
            "plain text",
            &[parse_mode(BodyMode::Text), sender_name("Ops")],
        )
        .await
        .unwrap();

        let raw = &backend.raw()[0];
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("From: Ops <alerts@example.com>"));
    }

    #[tokio::test]
    async fn attachments_are_included() {
        let backend = RecordingBackend::default();
        let service =
            EmailService::with_backend(config(&["a@example.com"]), backend.clone()).unwrap();
        let file = Attachment::from_bytes(&b"x"[..], "notes.txt", "text/plain", false);

        Service::send(
            &service,
            &SendContext::new(),
            "s",
            "",
            &[with_attachments([file])],
        )
        .await
        .unwrap();

        assert!(backend.raw()[0].contains("filename=\"notes.txt\""));
    }

    #[tokio::test]
    async fn failures_are_attributed_per_address() {
        let backend = RecordingBackend::rejecting("bad@example.com");
        let service = EmailService::with_backend(
            config(&["bad@example.com", "not an address", "ok@example.com"]),
            backend.clone(),
        )
        .unwrap();

        let err = Service::send(
            &service,
            &SendContext::new(),
            "s",
            "m",
            &[with_continue_on_err(true)],
        )
        .await
        .unwrap_err();

        let send = err.as_send_error().unwrap();
        assert_eq!(
            send.failed_recipients().collect::<Vec<_>>(),
            ["bad@example.com", "not an address"]
        );
        assert!(matches!(
            send.cause_for("not an address"),
            Some(DeliveryError::InvalidPayload(_))
        ));
        assert_eq!(backend.raw().len(), 1);
    }

    #[tokio::test]
    async fn copies_go_on_every_per_recipient_message() {
        let backend = RecordingBackend::default();
        let config = config(&["a@example.com", "b@example.com"]).with_cc(["lead@example.com"]);
        let service = EmailService::with_backend(config, backend.clone()).unwrap();
        service.add_bcc_recipients(["audit@example.com"]);

        Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap();

        let sent = backend.sent.lock();
        assert_eq!(sent.len(), 2);
        for message in sent.iter() {
            let to: Vec<String> = message.envelope().to().iter().map(ToString::to_string).collect();
            assert!(to.contains(&"lead@example.com".to_owned()));
            assert!(to.contains(&"audit@example.com".to_owned()));
        }
    }

    #[tokio::test]
    async fn invalid_copy_address_is_a_configuration_error() {
        let backend = RecordingBackend::default();
        let service =
            EmailService::with_backend(config(&["a@example.com"]), backend.clone()).unwrap();
        service.add_cc_recipients(["not an address"]);

        let err = Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(_)));
        assert!(backend.raw().is_empty());
    }

    #[tokio::test]
    async fn dry_run_builds_but_does_not_send() {
        let backend = RecordingBackend::default();
        let service =
            EmailService::with_backend(config(&["a@example.com"]), backend.clone()).unwrap();

        Service::send(&service, &SendContext::new(), "s", "m", &[with_dry_run(true)])
            .await
            .unwrap();
        assert!(backend.raw().is_empty());
    }

    #[test]
    fn invalid_sender_is_rejected_at_construction() {
        let err = EmailService::with_backend(
            EmailConfig::new("localhost", "not-an-address"),
            RecordingBackend::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EmailError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn no_recipients() {
        let service =
            EmailService::with_backend(config(&[]), RecordingBackend::default()).unwrap();
        let err = Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::NoRecipients));
    }
}
