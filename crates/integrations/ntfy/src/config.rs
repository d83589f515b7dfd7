use serde::Deserialize;

/// Message priority, from `min` (1) to `max` (5).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Min,
    Low,
    #[default]
    Default,
    High,
    Max,
}

impl Priority {
    /// The numeric value ntfy expects on the wire.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Min => 1,
            Self::Low => 2,
            Self::Default => 3,
            Self::High => 4,
            Self::Max => 5,
        }
    }
}

/// How ntfy renders the message body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Text,
    Markdown,
}

/// Configuration for the ntfy service.
///
/// ```toml
/// topics = ["deploys"]
/// priority = "high"
/// tags = ["rocket"]
/// ```
#[derive(Clone, Deserialize)]
pub struct NtfyConfig {
    /// Access token. Leave empty for public topics.
    #[serde(default)]
    pub token: String,

    /// Topics that receive every notification.
    #[serde(default)]
    pub topics: Vec<String>,

    #[serde(default = "default_name")]
    pub name: String,

    /// Server base URL. Point this at a self-hosted instance or a mock.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub parse_mode: ParseMode,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub icon: Option<String>,

    /// Scheduled delivery, e.g. `"30m"` or `"tomorrow, 10am"`.
    #[serde(default)]
    pub delay: Option<String>,

    /// URL opened when the notification is clicked.
    #[serde(default)]
    pub click_action: Option<String>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub continue_on_err: bool,
}

fn default_name() -> String {
    "ntfy".to_owned()
}

fn default_api_base_url() -> String {
    "https://ntfy.sh".to_owned()
}

impl std::fmt::Debug for NtfyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NtfyConfig")
            .field("token", &"[REDACTED]")
            .field("topics", &self.topics)
            .field("name", &self.name)
            .field("api_base_url", &self.api_base_url)
            .field("parse_mode", &self.parse_mode)
            .field("priority", &self.priority)
            .field("tags", &self.tags)
            .field("icon", &self.icon)
            .field("delay", &self.delay)
            .field("click_action", &self.click_action)
            .field("dry_run", &self.dry_run)
            .field("continue_on_err", &self.continue_on_err)
            .finish()
    }
}

impl Default for NtfyConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            topics: Vec::new(),
            name: default_name(),
            api_base_url: default_api_base_url(),
            parse_mode: ParseMode::default(),
            priority: Priority::default(),
            tags: Vec::new(),
            icon: None,
            delay: None,
            click_action: None,
            dry_run: false,
            continue_on_err: false,
        }
    }
}

impl NtfyConfig {
    /// Configuration for public topics on `ntfy.sh`.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    #[must_use]
    pub fn with_topics(mut self, topics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_wire_values() {
        assert_eq!(Priority::Min.as_u8(), 1);
        assert_eq!(Priority::default().as_u8(), 3);
        assert_eq!(Priority::Max.as_u8(), 5);
        assert!(Priority::High > Priority::Low);
    }

    #[test]
    fn deserializes_from_toml() {
        let config: NtfyConfig = toml::from_str(
            r#"
            topics = ["deploys", "alerts"]
            api_base_url = "https://ntfy.example.com"
            priority = "high"
            parse_mode = "markdown"
            tags = ["rocket"]
            delay = "10m"
            "#,
        )
        .unwrap();
        assert_eq!(config.topics, ["deploys", "alerts"]);
        assert_eq!(config.priority, Priority::High);
        assert_eq!(config.parse_mode, ParseMode::Markdown);
        assert_eq!(config.delay.as_deref(), Some("10m"));
        assert!(config.token.is_empty());
        assert_eq!(config.name, "ntfy");
    }
}
