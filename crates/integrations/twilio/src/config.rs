use serde::Deserialize;

/// Configuration for the Twilio SMS service.
///
/// ```toml
/// account_sid = "ACXXXXXXXX"
/// auth_token = "..."
/// from_number = "+15551234567"
/// phone_numbers = ["+15559876543"]
/// ```
#[derive(Clone, Deserialize)]
pub struct TwilioConfig {
    /// Twilio Account SID used to authenticate API requests.
    pub account_sid: String,

    /// Twilio Auth Token used for HTTP Basic authentication.
    pub auth_token: String,

    /// Sender phone number (E.164) or messaging service SID.
    #[serde(default)]
    pub from_number: String,

    /// Destination phone numbers in E.164 format.
    #[serde(default)]
    pub phone_numbers: Vec<String>,

    #[serde(default = "default_name")]
    pub name: String,

    /// Base URL for the Twilio REST API. Override this for testing against a
    /// mock server.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub continue_on_err: bool,
}

fn default_name() -> String {
    "twilio".to_owned()
}

fn default_api_base_url() -> String {
    "https://api.twilio.com".to_owned()
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .field("phone_numbers", &self.phone_numbers.len())
            .field("name", &self.name)
            .field("api_base_url", &self.api_base_url)
            .field("dry_run", &self.dry_run)
            .field("continue_on_err", &self.continue_on_err)
            .finish()
    }
}

impl TwilioConfig {
    /// Create a new configuration with the given Account SID and Auth Token.
    ///
    /// Uses the default Twilio API base URL (`https://api.twilio.com`).
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: String::new(),
            phone_numbers: Vec::new(),
            name: default_name(),
            api_base_url: default_api_base_url(),
            dry_run: false,
            continue_on_err: false,
        }
    }

    #[must_use]
    pub fn with_from_number(mut self, number: impl Into<String>) -> Self {
        self.from_number = number.into();
        self
    }

    #[must_use]
    pub fn with_phone_numbers(
        mut self,
        numbers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.phone_numbers = numbers.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the API base URL (useful for testing).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_continue_on_err(mut self, continue_on_err: bool) -> Self {
        self.continue_on_err = continue_on_err;
        self
    }
}
