use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error};

use crate::backend::EmailBackend;
use crate::config::SmtpConfig;
use crate::error::EmailError;

/// SMTP delivery backend using `lettre`.
pub struct SmtpBackend {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpBackend")
            .field("config", &self.config)
            .field("transport", &"<AsyncSmtpTransport>")
            .finish()
    }
}

impl SmtpBackend {
    /// Create a backend from the given SMTP configuration.
    ///
    /// No connection is made until the first message is sent.
    pub fn new(config: SmtpConfig) -> Result<Self, EmailError> {
        let transport = build_transport(&config)?;
        Ok(Self { config, transport })
    }

    /// Create a backend around a pre-built transport.
    pub fn with_transport(
        config: SmtpConfig,
        transport: AsyncSmtpTransport<Tokio1Executor>,
    ) -> Self {
        Self { config, transport }
    }
}

#[async_trait]
impl EmailBackend for SmtpBackend {
    async fn send(&self, message: Message) -> Result<(), EmailError> {
        debug!(host = %self.config.smtp_host, "sending email via SMTP");
        self.transport.send(message).await.map_err(|e| {
            error!(error = %e, "SMTP send failed");
            EmailError::Smtp(e)
        })?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "smtp"
    }
}

fn build_transport(
    config: &SmtpConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
    let builder = if config.tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| EmailError::Configuration(format!("SMTP TLS relay error: {e}")))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
    };

    let builder = builder.port(config.smtp_port);

    let builder = if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        builder.credentials(Credentials::new(user.clone(), pass.clone()))
    } else {
        builder
    };

    Ok(builder.build())
}
