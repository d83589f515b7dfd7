use herald_service::{DeliveryError, NotifyError};
use thiserror::Error;

/// Errors specific to the email service.
#[derive(Debug, Error)]
pub enum EmailError {
    /// An address failed to parse.
    #[error("invalid address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        source: lettre::address::AddressError,
    },

    /// The MIME message could not be assembled.
    #[error("failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The transport could not be set up.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<EmailError> for DeliveryError {
    fn from(err: EmailError) -> Self {
        match err {
            EmailError::InvalidAddress { .. } | EmailError::Build(_) => {
                DeliveryError::InvalidPayload(err.to_string())
            }
            EmailError::Smtp(e) => map_smtp_error(&e),
            EmailError::Configuration(msg) => DeliveryError::BadRequest(msg),
        }
    }
}

impl From<EmailError> for NotifyError {
    fn from(err: EmailError) -> Self {
        NotifyError::Configuration(err.to_string())
    }
}

/// Map an SMTP error onto the shared taxonomy.
///
/// Reply codes 530/535 mean authentication failed, 421/450/451/452 ask the
/// client to retry later.
fn map_smtp_error(error: &lettre::transport::smtp::Error) -> DeliveryError {
    let message = error.to_string();
    let code = error.status().map(u16::from);

    match code {
        Some(530 | 535) => DeliveryError::Unauthorized(message),
        Some(421 | 450 | 451 | 452) => DeliveryError::RateLimited(message),
        _ if error.is_permanent() => DeliveryError::BadRequest(message),
        _ if error.is_transient() => DeliveryError::ExternalServer(message),
        _ => DeliveryError::Connection(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_address_maps_to_invalid_payload() {
        let source = "nope".parse::<lettre::Address>().unwrap_err();
        let err: DeliveryError = EmailError::InvalidAddress {
            address: "nope".into(),
            source,
        }
        .into();
        assert!(matches!(err, DeliveryError::InvalidPayload(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn configuration_error_becomes_notify_configuration() {
        let err: NotifyError = EmailError::Configuration("bad relay".into()).into();
        assert!(matches!(err, NotifyError::Configuration(_)));
    }
}
