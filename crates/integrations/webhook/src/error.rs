use herald_service::DeliveryError;
use thiserror::Error;

/// Error type returned by pre- and post-send hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Errors specific to the webhook service.
///
/// These are internal errors that get converted into [`DeliveryError`] at the
/// public API boundary.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// An HTTP-level transport error occurred, or the request could not be
    /// built.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx status.
    #[error(transparent)]
    Rejected(#[from] DeliveryError),

    /// A configured header name or value is not valid HTTP.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// A pre-send hook refused the request.
    #[error("pre-send hook failed: {0}")]
    PreSendHook(HookError),

    /// A post-send hook rejected the response.
    #[error("post-send hook failed: {0}")]
    PostSendHook(HookError),
}

impl From<WebhookError> for DeliveryError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::Http(e) => e.into(),
            WebhookError::Rejected(e) => e,
            WebhookError::InvalidHeader { .. } | WebhookError::PreSendHook(_) => {
                DeliveryError::InvalidPayload(err.to_string())
            }
            WebhookError::PostSendHook(_) => DeliveryError::BadRequest(err.to_string()),
        }
    }
}
