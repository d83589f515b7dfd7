use serde::Deserialize;

/// Content type used for the message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyMode {
    #[default]
    Html,
    Text,
}

/// SMTP connection settings.
#[derive(Clone, Deserialize)]
pub struct SmtpConfig {
    pub smtp_host: String,

    /// Defaults to 587 (STARTTLS submission port).
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Use STARTTLS. Defaults to `true`.
    #[serde(default = "default_tls")]
    pub tls: bool,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("tls", &self.tls)
            .finish()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_owned(),
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            tls: default_tls(),
        }
    }
}

/// Full email service configuration.
///
/// ```toml
/// from_address = "alerts@example.com"
/// sender_name = "Alerts"
/// recipients = ["oncall@example.com"]
///
/// [smtp]
/// smtp_host = "smtp.example.com"
/// username = "alerts"
/// password = "..."
/// ```
#[derive(Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// The `From` address of every message.
    pub from_address: String,

    /// Display name shown next to `from_address`.
    #[serde(default)]
    pub sender_name: Option<String>,

    #[serde(default)]
    pub recipients: Vec<String>,

    /// Copied on every message. Each recipient still gets its own message.
    #[serde(default)]
    pub cc: Vec<String>,

    /// Blind-copied on every message.
    #[serde(default)]
    pub bcc: Vec<String>,

    #[serde(default)]
    pub body_mode: BodyMode,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub continue_on_err: bool,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_tls() -> bool {
    true
}

fn default_name() -> String {
    "email".to_owned()
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp", &self.smtp)
            .field("from_address", &self.from_address)
            .field("sender_name", &self.sender_name)
            .field("recipients", &self.recipients.len())
            .field("cc", &self.cc.len())
            .field("bcc", &self.bcc.len())
            .field("body_mode", &self.body_mode)
            .field("name", &self.name)
            .field("dry_run", &self.dry_run)
            .field("continue_on_err", &self.continue_on_err)
            .finish()
    }
}

impl EmailConfig {
    /// Create a configuration for the given SMTP host and sender address.
    pub fn new(smtp_host: impl Into<String>, from_address: impl Into<String>) -> Self {
        Self {
            smtp: SmtpConfig {
                smtp_host: smtp_host.into(),
                ..SmtpConfig::default()
            },
            from_address: from_address.into(),
            sender_name: None,
            recipients: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            body_mode: BodyMode::default(),
            name: default_name(),
            dry_run: false,
            continue_on_err: false,
        }
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.smtp.username = Some(username.into());
        self.smtp.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.smtp.smtp_port = port;
        self
    }

    #[must_use]
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.smtp.tls = tls;
        self
    }

    #[must_use]
    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
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
    pub fn with_cc(mut self, addresses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cc = addresses.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_bcc(mut self, addresses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.bcc = addresses.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_body_mode(mut self, mode: BodyMode) -> Self {
        self.body_mode = mode;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
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
