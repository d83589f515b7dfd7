use serde::Deserialize;

/// How the Discord service authenticates, which also decides what a
/// recipient is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Bot token; recipients are channel IDs.
    #[default]
    Bot,
    /// OAuth2 bearer token; recipients are channel IDs.
    Bearer,
    /// No token; recipients are full webhook URLs.
    Webhook,
}

/// Configuration for the Discord service.
#[derive(Clone, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub auth: AuthMode,

    /// Bot or OAuth2 token. Ignored in webhook mode.
    #[serde(default)]
    pub token: String,

    /// Channel IDs, or webhook URLs in webhook mode.
    #[serde(default)]
    pub recipients: Vec<String>,

    #[serde(default = "default_name")]
    pub name: String,

    /// Base URL for the Discord REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Username override for webhook messages.
    #[serde(default)]
    pub username: Option<String>,

    /// Avatar override for webhook messages.
    #[serde(default)]
    pub avatar_url: Option<String>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub continue_on_err: bool,
}

fn default_name() -> String {
    "discord".to_owned()
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_owned()
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("auth", &self.auth)
            .field("token", &"[REDACTED]")
            .field("recipients", &format!("[{} recipient(s)]", self.recipients.len()))
            .field("name", &self.name)
            .field("api_base_url", &self.api_base_url)
            .field("username", &self.username)
            .field("avatar_url", &self.avatar_url)
            .field("dry_run", &self.dry_run)
            .field("continue_on_err", &self.continue_on_err)
            .finish()
    }
}

impl DiscordConfig {
    fn with_auth(auth: AuthMode, token: String) -> Self {
        Self {
            auth,
            token,
            recipients: Vec::new(),
            name: default_name(),
            api_base_url: default_api_base_url(),
            username: None,
            avatar_url: None,
            dry_run: false,
            continue_on_err: false,
        }
    }

    /// Authenticate as a bot. A missing `Bot ` prefix is added.
    pub fn bot(token: impl Into<String>) -> Self {
        Self::with_auth(AuthMode::Bot, token.into())
    }

    /// Authenticate with an OAuth2 bearer token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::with_auth(AuthMode::Bearer, token.into())
    }

    /// Post to webhook URLs; no token needed.
    pub fn webhook() -> Self {
        Self::with_auth(AuthMode::Webhook, String::new())
    }

    #[must_use]
    pub fn with_recipients(
        mut self,
        recipients: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.recipients = recipients.into_iter().map(Into::into).collect();
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
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
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

    /// The `Authorization` header value, if this mode uses one.
    pub(crate) fn authorization(&self) -> Option<String> {
        let (prefix, token) = match self.auth {
            AuthMode::Bot => ("Bot ", self.token.as_str()),
            AuthMode::Bearer => ("Bearer ", self.token.as_str()),
            AuthMode::Webhook => return None,
        };
        if token.starts_with(prefix) {
            Some(token.to_owned())
        } else {
            Some(format!("{prefix}{token}"))
        }
    }
}
