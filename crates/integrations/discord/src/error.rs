use herald_service::DeliveryError;
use thiserror::Error;

/// Errors specific to the Discord service.
///
/// These are internal errors that get converted into [`DeliveryError`] at the
/// public API boundary.
#[derive(Debug, Error)]
pub enum DiscordError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Discord answered with a non-2xx status.
    #[error(transparent)]
    Rejected(#[from] DeliveryError),

    /// The recipient is not a usable channel ID or webhook URL.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The request could not be built.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<DiscordError> for DeliveryError {
    fn from(err: DiscordError) -> Self {
        match err {
            DiscordError::Http(e) => e.into(),
            DiscordError::Rejected(e) => e,
            DiscordError::InvalidRecipient(msg) | DiscordError::InvalidPayload(msg) => {
                DeliveryError::InvalidPayload(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_recipient_maps_to_invalid_payload() {
        let err: DeliveryError = DiscordError::InvalidRecipient("not a url".into()).into();
        assert!(matches!(err, DeliveryError::InvalidPayload(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn rejected_passes_through() {
        let err: DeliveryError =
            DiscordError::Rejected(DeliveryError::from_status(429, "slow")).into();
        assert!(err.is_retryable());
    }
}
