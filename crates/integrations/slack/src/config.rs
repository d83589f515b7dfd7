use serde::Deserialize;

/// Configuration for the Slack service.
///
/// Can be built in code or deserialized from a host's config file:
///
/// ```toml
/// token = "xoxb-..."
/// channels = ["C0123456789"]
/// continue_on_err = true
/// ```
#[derive(Clone, Deserialize)]
pub struct SlackConfig {
    /// Bot or user OAuth token used to authenticate API requests.
    pub token: String,

    /// Channel IDs that receive every notification.
    #[serde(default)]
    pub channels: Vec<String>,

    /// Service name used in logs and error attribution.
    #[serde(default = "default_name")]
    pub name: String,

    /// Base URL for the Slack Web API. Override this for testing against a
    /// mock server.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Escape `&`, `<` and `>` so Slack shows them literally.
    #[serde(default)]
    pub escape_message: bool,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub continue_on_err: bool,
}

fn default_name() -> String {
    "slack".to_owned()
}

fn default_api_base_url() -> String {
    "https://slack.com/api".to_owned()
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("token", &"[REDACTED]")
            .field("channels", &self.channels)
            .field("name", &self.name)
            .field("api_base_url", &self.api_base_url)
            .field("escape_message", &self.escape_message)
            .field("dry_run", &self.dry_run)
            .field("continue_on_err", &self.continue_on_err)
            .finish()
    }
}

impl SlackConfig {
    /// Create a new configuration with the given token.
    ///
    /// Uses the default Slack API base URL (`https://slack.com/api`).
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            channels: Vec::new(),
            name: default_name(),
            api_base_url: default_api_base_url(),
            escape_message: false,
            dry_run: false,
            continue_on_err: false,
        }
    }

    /// Replace the channel list.
    #[must_use]
    pub fn with_channels(mut self, channels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.channels = channels.into_iter().map(Into::into).collect();
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
    pub fn with_escape_message(mut self, escape: bool) -> Self {
        self.escape_message = escape;
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
