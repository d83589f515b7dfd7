use herald_service::DeliveryError;
use thiserror::Error;

/// Errors specific to the Twilio service.
///
/// These are internal errors that get converted into [`DeliveryError`] at the
/// public API boundary.
#[derive(Debug, Error)]
pub enum TwilioError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Twilio answered with a non-2xx status.
    #[error(transparent)]
    Rejected(#[from] DeliveryError),

    /// The Twilio API accepted the request but reported an error code.
    #[error("Twilio API error: {0}")]
    Api(String),

    /// The recipient is not an E.164 phone number.
    #[error("invalid phone number: {0}")]
    InvalidNumber(String),
}

impl From<TwilioError> for DeliveryError {
    fn from(err: TwilioError) -> Self {
        match err {
            TwilioError::Http(e) => e.into(),
            TwilioError::Rejected(e) => e,
            TwilioError::Api(msg) => DeliveryError::BadRequest(msg),
            TwilioError::InvalidNumber(msg) => DeliveryError::InvalidPayload(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_maps_to_non_retryable() {
        let err: DeliveryError = TwilioError::Api("invalid_auth".into()).into();
        assert!(!err.is_retryable());
        assert!(matches!(err, DeliveryError::BadRequest(_)));
    }

    #[test]
    fn invalid_number_maps_to_invalid_payload() {
        let err: DeliveryError = TwilioError::InvalidNumber("555".into()).into();
        assert!(matches!(err, DeliveryError::InvalidPayload(_)));
    }

    #[test]
    fn error_display() {
        let err = TwilioError::Api("21211".into());
        assert_eq!(err.to_string(), "Twilio API error: 21211");
    }
}
