//! The per-service recipient loop every backend shares.
//!
//! A backend's `send` is normally three steps:
//!
//! 1. [`prepare`] checks the recipient list, builds the [`SendConfig`] and
//!    decides whether there is anything to deliver.
//! 2. [`deliver`] walks the recipients in order, checking the context before
//!    each one and collecting normalized failures.
//! 3. Inside the per-recipient closure the backend builds its request and
//!    either performs it or, in dry-run mode, calls [`log_dry_run`].

use std::fmt;
use std::future::Future;

use herald_core::{SendConfig, SendContext, SendOption};
use tracing::{debug, info, warn};

use crate::error::{DeliveryError, NotifyError, RecipientFailure, SendError};
use crate::settings::ServiceSettings;

/// Outcome of [`prepare`].
#[derive(Debug)]
pub enum Prepared<X> {
    /// Nothing to deliver: the rendered message is empty and there are no
    /// attachments. The send succeeds without contacting anyone.
    Skip,
    /// Deliver using this config.
    Ready(SendConfig<X>),
}

/// Validate the recipients and build the config for one send call.
///
/// # Errors
///
/// Returns [`NotifyError::NoRecipients`] when `recipients` is empty.
pub fn prepare<R, X>(
    settings: &ServiceSettings<X>,
    recipients: &[R],
    subject: &str,
    message: &str,
    options: &[SendOption],
) -> Result<Prepared<X>, NotifyError>
where
    X: Clone + 'static,
{
    if recipients.is_empty() {
        warn!(service = settings.name(), "no recipients configured");
        return Err(NotifyError::NoRecipients);
    }

    let config = settings.build_config(subject, message, options);
    if config.is_empty() {
        warn!(
            service = settings.name(),
            "message is empty and there are no attachments, skipping send"
        );
        return Ok(Prepared::Skip);
    }

    Ok(Prepared::Ready(config))
}

/// Run `send_one` for each recipient in order.
///
/// The context is checked before every recipient; once it is done the loop
/// stops and the context error is returned as-is, discarding any failures
/// collected so far. A recipient failure ends the loop immediately unless
/// `continue_on_err` is set, in which case every failure is collected and
/// reported together once all recipients have been attempted.
///
/// # Errors
///
/// [`NotifyError::Context`] on cancellation or deadline,
/// [`NotifyError::Send`] when at least one recipient failed.
pub async fn deliver<R, F, Fut>(
    ctx: &SendContext,
    service: &str,
    recipients: &[R],
    continue_on_err: bool,
    mut send_one: F,
) -> Result<(), NotifyError>
where
    R: Clone + fmt::Display,
    F: FnMut(R) -> Fut,
    Fut: Future<Output = Result<(), DeliveryError>>,
{
    debug!(service, recipients = recipients.len(), "sending to recipients");

    let mut failures = Vec::new();
    for recipient in recipients {
        if let Some(err) = ctx.err() {
            debug!(service, error = %err, "send interrupted by context");
            return Err(err.into());
        }

        if let Err(cause) = send_one(recipient.clone()).await {
            warn!(service, recipient = %recipient, error = %cause, "failed to send to recipient");
            failures.push(RecipientFailure::new(recipient.to_string(), cause));
            if !continue_on_err {
                break;
            }
        }
    }

    if let Some(err) = SendError::from_failures(failures) {
        return Err(err.into());
    }

    info!(service, recipients = recipients.len(), "message sent to all recipients");
    Ok(())
}

/// Log a request that was built but not sent because dry run is on.
pub fn log_dry_run(service: &str, recipient: &dyn fmt::Display, item: &str) {
    info!(service, recipient = %recipient, item, "dry run enabled, not sending");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use herald_core::{Attachment, ContextError, render, with_attachments};
    use parking_lot::Mutex;

    use super::*;

    fn settings() -> ServiceSettings<()> {
        ServiceSettings::new("test", (), render::subject_and_message)
    }

    #[test]
    fn prepare_rejects_empty_recipient_list() {
        let err = prepare::<String, _>(&settings(), &[], "s", "m", &[]).unwrap_err();
        assert!(matches!(err, NotifyError::NoRecipients));
    }

    #[test]
    fn prepare_skips_empty_payload() {
        let prepared = prepare(&settings(), &["a"], "", "", &[]).unwrap();
        assert!(matches!(prepared, Prepared::Skip));
    }

    #[test]
    fn prepare_keeps_attachment_only_payload() {
        let file = Attachment::from_bytes(&b"x"[..], "x.txt", "text/plain", false);
        let prepared = prepare(&settings(), &["a"], "", "", &[with_attachments([file])]).unwrap();
        let Prepared::Ready(config) = prepared else {
            panic!("expected ready config");
        };
        assert_eq!(config.attachments.len(), 1);
    }

    #[tokio::test]
    async fn all_recipients_attempted_in_order() {
        let seen = Mutex::new(Vec::new());
        deliver(&SendContext::new(), "test", &["r1", "r2", "r3"], false, |r| {
            seen.lock().push(r);
            async { Ok(()) }
        })
        .await
        .unwrap();
        assert_eq!(*seen.lock(), ["r1", "r2", "r3"]);
    }

    #[tokio::test]
    async fn first_failure_stops_without_continue_on_err() {
        let attempts = AtomicUsize::new(0);
        let err = deliver(&SendContext::new(), "test", &["r1", "r2", "r3"], false, |r| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if r == "r2" {
                    Err(DeliveryError::BadRequest("bad".into()))
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        let send = err.as_send_error().unwrap();
        assert_eq!(send.failed_recipients().collect::<Vec<_>>(), ["r2"]);
    }

    #[tokio::test]
    async fn continue_on_err_collects_every_failure() {
        let attempts = AtomicUsize::new(0);
        let err = deliver(&SendContext::new(), "test", &["r1", "r2", "r3"], true, |r| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                match r {
                    "r1" => Err(DeliveryError::from_status(429, "slow down")),
                    "r3" => Err(DeliveryError::from_status(400, "bad")),
                    _ => Ok(()),
                }
            }
        })
        .await
        .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        let send = err.as_send_error().unwrap();
        assert_eq!(send.failed_recipients().collect::<Vec<_>>(), ["r1", "r3"]);
        assert!(matches!(send.cause_for("r1"), Some(DeliveryError::RateLimited(_))));
        assert!(matches!(send.cause_for("r3"), Some(DeliveryError::BadRequest(_))));
    }

    #[tokio::test]
    async fn cancelled_context_attempts_nothing() {
        let ctx = SendContext::new();
        ctx.cancel();
        let attempts = AtomicUsize::new(0);
        let err = deliver(&ctx, "test", &["r1", "r2"], true, |_| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await
        .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 0);
        assert_eq!(err.as_context_error(), Some(ContextError::Cancelled));
    }

    #[tokio::test]
    async fn cancellation_mid_loop_stops_remaining_recipients() {
        let ctx = SendContext::new();
        let attempts = AtomicUsize::new(0);
        let err = deliver(&ctx, "test", &["r1", "r2", "r3"], true, |_| {
            attempts.fetch_add(1, Ordering::SeqCst);
            ctx.cancel();
            async { Err(DeliveryError::Connection("reset".into())) }
        })
        .await
        .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(err, NotifyError::Context(ContextError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_is_reported() {
        let ctx = SendContext::new().with_timeout(std::time::Duration::from_millis(5));
        tokio::time::advance(std::time::Duration::from_millis(10)).await;
        let err = deliver(&ctx, "test", &["r1"], false, |_| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Context(ContextError::DeadlineExceeded)));
    }
}
