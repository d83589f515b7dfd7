use herald_service::DeliveryError;
use thiserror::Error;

/// Errors specific to the ntfy service.
#[derive(Debug, Error)]
pub enum NtfyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Rejected(#[from] DeliveryError),
}

impl From<NtfyError> for DeliveryError {
    fn from(err: NtfyError) -> Self {
        match err {
            NtfyError::Http(e) => e.into(),
            NtfyError::Rejected(e) => e,
        }
    }
}
