use herald_service::DeliveryError;
use thiserror::Error;

/// Errors specific to the Telegram service.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Telegram answered with a non-2xx status.
    #[error(transparent)]
    Rejected(#[from] DeliveryError),

    /// A 2xx response carrying `ok: false`.
    #[error("Telegram API error {code}: {description}")]
    Api { code: u16, description: String },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<TelegramError> for DeliveryError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::Http(e) => e.into(),
            TelegramError::Rejected(e) => e,
            TelegramError::Api { code, description } => {
                DeliveryError::from_status(code, description)
            }
            TelegramError::InvalidPayload(msg) => DeliveryError::InvalidPayload(msg),
        }
    }
}
