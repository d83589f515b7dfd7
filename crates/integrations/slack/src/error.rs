use herald_service::DeliveryError;
use thiserror::Error;

/// Errors specific to the Slack service.
///
/// These are internal errors that get converted into [`DeliveryError`] at the
/// public API boundary.
#[derive(Debug, Error)]
pub enum SlackError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Slack answered with a non-2xx status.
    #[error(transparent)]
    Rejected(#[from] DeliveryError),

    /// The Slack API returned an error response (`ok: false`).
    #[error("Slack API error: {0}")]
    Api(String),

    /// A request could not be built.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<SlackError> for DeliveryError {
    fn from(err: SlackError) -> Self {
        match err {
            SlackError::Http(e) => e.into(),
            SlackError::Rejected(e) => e,
            SlackError::Api(code) => match code.as_str() {
                "not_authed" | "invalid_auth" | "account_inactive" | "token_revoked"
                | "token_expired" | "missing_scope" => DeliveryError::Unauthorized(code),
                "ratelimited" | "rate_limited" => DeliveryError::RateLimited(code),
                "internal_error" | "fatal_error" | "service_unavailable" => {
                    DeliveryError::ExternalServer(code)
                }
                _ => DeliveryError::BadRequest(format!("Slack API error: {code}")),
            },
            SlackError::InvalidPayload(msg) => DeliveryError::InvalidPayload(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_codes_map_to_unauthorized() {
        let err: DeliveryError = SlackError::Api("invalid_auth".into()).into();
        assert!(matches!(err, DeliveryError::Unauthorized(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn rate_limit_code_maps_to_retryable() {
        let err: DeliveryError = SlackError::Api("ratelimited".into()).into();
        assert!(matches!(err, DeliveryError::RateLimited(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn unknown_codes_map_to_bad_request() {
        let err: DeliveryError = SlackError::Api("channel_not_found".into()).into();
        assert_eq!(err.to_string(), "bad request: Slack API error: channel_not_found");
    }

    #[test]
    fn status_rejections_pass_through() {
        let err: DeliveryError =
            SlackError::Rejected(DeliveryError::from_status(503, "down")).into();
        assert!(matches!(err, DeliveryError::ExternalServer(_)));
    }
}
