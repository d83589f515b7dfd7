//! Helpers for services built on `reqwest`.

use std::time::Duration;

use tracing::debug;

use crate::error::DeliveryError;

/// Default request timeout for service HTTP clients.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the HTTP client services use unless one is supplied.
pub fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Pass successful responses through; turn any other status into a
/// [`DeliveryError`] carrying the response body.
///
/// # Errors
///
/// Returns the status-derived [`DeliveryError`] for non-2xx responses.
pub async fn check_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), body = %body, "request rejected");
    Err(DeliveryError::from_status(
        status.as_u16(),
        format!("HTTP {status}: {}", body.trim()),
    ))
}

/// The request URL is dropped first. Some services carry secrets in it
/// (Telegram bot tokens, Discord webhook tokens).
impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if let Some(status) = e.status() {
            return Self::from_status(status.as_u16(), e.to_string());
        }
        if e.is_builder() {
            return Self::InvalidPayload(e.to_string());
        }
        Self::Connection(e.to_string())
    }
}
