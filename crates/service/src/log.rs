use herald_core::{SendContext, SendOption, render};
use tracing::info;

use crate::error::NotifyError;
use crate::fanout::{self, Prepared};
use crate::service::Service;
use crate::settings::{Recipients, ServiceSettings};

/// A service that logs each notification instead of delivering it.
///
/// Useful for local development and tests where no real backend is
/// available. It goes through the same recipient fan-out as every other
/// service, so empty-recipient and cancellation behavior is identical.
pub struct LogService {
    settings: ServiceSettings<()>,
    targets: Recipients<String>,
}

impl LogService {
    /// Create a `LogService` with the given name and no targets.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            settings: ServiceSettings::new(name, (), render::subject_and_message),
            targets: Recipients::default(),
        }
    }

    /// Add log targets. Each one produces its own log line per send.
    #[must_use]
    pub fn with_targets(self, targets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.add_targets(targets);
        self
    }

    pub fn add_targets(&self, targets: impl IntoIterator<Item = impl Into<String>>) {
        self.targets.add(targets.into_iter().map(Into::into));
    }
}

impl Service for LogService {
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
        let targets = self.targets.snapshot();
        let config = match fanout::prepare(&self.settings, &targets, subject, message, options)? {
            Prepared::Skip => return Ok(()),
            Prepared::Ready(config) => config,
        };
        let config = &config;
        let service = self.settings.name();

        fanout::deliver(ctx, service, &targets, config.continue_on_err, |target| async move {
            if config.dry_run {
                fanout::log_dry_run(service, &target, "log line");
                return Ok(());
            }
            info!(
                service,
                log_target = %target,
                body = %config.message,
                attachments = config.attachments.len(),
                "notification"
            );
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_service_name() {
        let service = LogService::new("test-log");
        assert_eq!(Service::name(&service), "test-log");
    }

    #[tokio::test]
    async fn log_service_without_targets_fails() {
        let service = LogService::new("log");
        let err = Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::NoRecipients));
    }

    #[tokio::test]
    async fn log_service_sends_to_every_target() {
        let service = LogService::new("log").with_targets(["stdout", "audit"]);
        Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap();
    }
}
