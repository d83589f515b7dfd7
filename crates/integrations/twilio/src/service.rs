use herald_core::{SendConfig, SendContext, SendOption, render};
use herald_service::fanout::{self, Prepared};
use herald_service::http::{check_response, default_client};
use herald_service::{DeliveryError, NotifyError, Recipients, Service, ServiceSettings};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::TwilioConfig;
use crate::error::TwilioError;
use crate::types::{MessageResponse, SendMessageRequest};

/// Twilio service that sends SMS messages via the Twilio REST API.
///
/// SMS has no attachments; any passed in are ignored.
pub struct TwilioService {
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base_url: String,
    settings: ServiceSettings<()>,
    phone_numbers: Recipients<String>,
    client: Client,
}

impl TwilioService {
    /// Create a new Twilio service with the given configuration.
    pub fn new(config: TwilioConfig) -> Self {
        Self::with_client(config, default_client())
    }

    /// Create a new Twilio service with a custom HTTP client.
    ///
    /// Useful for testing or for sharing a connection pool across services.
    pub fn with_client(config: TwilioConfig, client: Client) -> Self {
        let settings = ServiceSettings::new(config.name, (), render::subject_and_message)
            .with_dry_run(config.dry_run)
            .with_continue_on_err(config.continue_on_err);
        Self {
            account_sid: config.account_sid,
            auth_token: config.auth_token,
            from_number: config.from_number,
            api_base_url: config.api_base_url,
            settings,
            phone_numbers: Recipients::new(config.phone_numbers),
            client,
        }
    }

    #[must_use]
    pub fn with_renderer(
        mut self,
        renderer: impl Fn(&SendConfig<()>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.settings = self.settings.with_renderer(renderer);
        self
    }

    /// Add E.164 phone numbers to the recipient list.
    pub fn add_recipients(&self, numbers: impl IntoIterator<Item = impl Into<String>>) {
        self.phone_numbers.add(numbers.into_iter().map(Into::into));
    }

    /// Build the Messages API URL for this account.
    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base_url, self.account_sid
        )
    }

    async fn send_sms(&self, to: &str, config: &SendConfig<()>) -> Result<(), TwilioError> {
        if !is_e164(to) {
            return Err(TwilioError::InvalidNumber(to.to_owned()));
        }
        let request = SendMessageRequest {
            to: to.to_owned(),
            from: self.from_number.clone(),
            body: config.message.clone(),
        };
        if config.dry_run {
            fanout::log_dry_run(self.settings.name(), &to, "sms");
            return Ok(());
        }

        debug!(to, "sending SMS via Twilio");
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&request)
            .send()
            .await?;
        let message: MessageResponse = check_response(response).await?.json().await?;

        if let Some(code) = message.error_code {
            return Err(TwilioError::Api(
                message
                    .error_message
                    .unwrap_or_else(|| format!("error code {code}")),
            ));
        }
        debug!(sid = ?message.sid, status = ?message.status, "SMS accepted");
        Ok(())
    }
}

/// `+` followed by 8 to 15 digits, the first non-zero.
fn is_e164(number: &str) -> bool {
    let Some(digits) = number.strip_prefix('+') else {
        return false;
    };
    (8..=15).contains(&digits.len())
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !digits.starts_with('0')
}

impl Service for TwilioService {
    fn name(&self) -> &str {
        self.settings.name()
    }

    #[instrument(skip_all, fields(service = %self.settings.name()))]
    async fn send(
        &self,
        ctx: &SendContext,
        subject: &str,
        message: &str,
        options: &[SendOption],
    ) -> Result<(), NotifyError> {
        if self.from_number.is_empty() {
            return Err(NotifyError::Configuration(
                "twilio: from_number is required".into(),
            ));
        }

        let numbers = self.phone_numbers.snapshot();
        let config = match fanout::prepare(&self.settings, &numbers, subject, message, options)? {
            Prepared::Skip => return Ok(()),
            Prepared::Ready(config) => config,
        };
        if !config.attachments.is_empty() {
            debug!(
                count = config.attachments.len(),
                "attachments are not supported by SMS, ignoring"
            );
        }
        let config = &config;

        fanout::deliver(
            ctx,
            self.settings.name(),
            &numbers,
            config.continue_on_err,
            |number| async move {
                self.send_sms(&number, config)
                    .await
                    .map_err(DeliveryError::from)
            },
        )
        .await
    }
}
