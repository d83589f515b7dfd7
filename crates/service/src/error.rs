use std::fmt;

use herald_core::{AttachmentError, ContextError};
use thiserror::Error;

/// Backend-independent classification of a single delivery failure.
///
/// Every raw transport error is translated into one of these before it is
/// recorded, so callers can branch on the failure class without knowing
/// which backend produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The backend rejected the credentials (HTTP 401/403).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The backend throttled the request (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The backend rejected the request as malformed (other HTTP 4xx).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The backend failed internally (HTTP 5xx).
    #[error("external server error: {0}")]
    ExternalServer(String),

    /// The request never produced a response (DNS, TLS, reset, timeout).
    #[error("connection error: {0}")]
    Connection(String),

    /// The request could not be built from the config (bad address, bad
    /// recipient format, serialization failure).
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl DeliveryError {
    /// Classify an HTTP status code.
    ///
    /// Statuses outside 4xx/5xx are not failures by themselves; when a
    /// backend still reports one as an error it is treated as a bad request.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Unauthorized(message),
            429 => Self::RateLimited(message),
            500.. => Self::ExternalServer(message),
            _ => Self::BadRequest(message),
        }
    }

    /// Whether a later attempt could plausibly succeed. Herald never retries
    /// on its own; this is for callers that do.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::ExternalServer(_) | Self::Connection(_)
        )
    }
}

/// One recipient that could not be reached, with the normalized cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to send notification to {recipient}: {cause}")]
pub struct RecipientFailure {
    pub recipient: String,
    #[source]
    pub cause: DeliveryError,
}

impl RecipientFailure {
    pub fn new(recipient: impl Into<String>, cause: DeliveryError) -> Self {
        Self {
            recipient: recipient.into(),
            cause,
        }
    }
}

/// Every recipient failure collected by one service's send call, in the
/// order the recipients were attempted. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendError {
    failures: Vec<RecipientFailure>,
}

impl SendError {
    /// `None` when `failures` is empty.
    pub fn from_failures(failures: Vec<RecipientFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    pub fn failures(&self) -> &[RecipientFailure] {
        &self.failures
    }

    /// Failed recipient identifiers, index-aligned with [`errors`](Self::errors).
    pub fn failed_recipients(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.recipient.as_str())
    }

    /// Normalized causes, index-aligned with [`failed_recipients`](Self::failed_recipients).
    pub fn errors(&self) -> impl Iterator<Item = &DeliveryError> {
        self.failures.iter().map(|f| &f.cause)
    }

    /// The cause recorded for `recipient`, if it failed.
    pub fn cause_for(&self, recipient: &str) -> Option<&DeliveryError> {
        self.failures
            .iter()
            .find(|f| f.recipient == recipient)
            .map(|f| &f.cause)
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Always `false`; present for API symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to send to {} recipient(s)", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{} ({})", failure.recipient, failure.cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}

/// Errors returned by [`Service::send`](crate::Service::send).
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The service has no recipients to send to.
    #[error("no recipients configured")]
    NoRecipients,

    /// The send context was cancelled or expired. Passed through untouched
    /// so callers can tell their own cancellation apart from a rejection.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// One or more recipients could not be reached.
    #[error(transparent)]
    Send(#[from] SendError),

    /// The service was constructed with unusable settings.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An attachment could not be loaded.
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

impl NotifyError {
    /// The per-recipient failures, when this is a delivery error.
    pub fn as_send_error(&self) -> Option<&SendError> {
        match self {
            Self::Send(err) => Some(err),
            _ => None,
        }
    }

    /// The context error, when the send was cut short by cancellation.
    pub fn as_context_error(&self) -> Option<ContextError> {
        match self {
            Self::Context(err) => Some(*err),
            _ => None,
        }
    }
}
