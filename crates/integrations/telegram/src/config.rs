use serde::{Deserialize, Serialize};

/// Formatting applied by Telegram to message text and captions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[default]
    #[serde(rename = "HTML")]
    Html,
    Markdown,
    MarkdownV2,
}

impl ParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "HTML",
            Self::Markdown => "Markdown",
            Self::MarkdownV2 => "MarkdownV2",
        }
    }
}

/// Configuration for the Telegram service.
///
/// ```toml
/// token = "123456:ABC-DEF"
/// chat_ids = [-1001234567890, 42]
/// parse_mode = "MarkdownV2"
/// ```
#[derive(Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`.
    pub token: String,

    /// Chat IDs that receive every notification. Groups and channels have
    /// negative IDs.
    #[serde(default)]
    pub chat_ids: Vec<i64>,

    #[serde(default = "default_name")]
    pub name: String,

    /// Base URL for the Bot API. Override this for testing against a mock
    /// server.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub parse_mode: ParseMode,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub continue_on_err: bool,
}

fn default_name() -> String {
    "telegram".to_owned()
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_owned()
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("chat_ids", &self.chat_ids)
            .field("name", &self.name)
            .field("api_base_url", &self.api_base_url)
            .field("parse_mode", &self.parse_mode)
            .field("dry_run", &self.dry_run)
            .field("continue_on_err", &self.continue_on_err)
            .finish()
    }
}

impl TelegramConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_ids: Vec::new(),
            name: default_name(),
            api_base_url: default_api_base_url(),
            parse_mode: ParseMode::default(),
            dry_run: false,
            continue_on_err: false,
        }
    }

    #[must_use]
    pub fn with_chat_ids(mut self, chat_ids: impl IntoIterator<Item = i64>) -> Self {
        self.chat_ids = chat_ids.into_iter().collect();
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
    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
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
    fn defaults() {
        let config = TelegramConfig::new("123:abc");
        assert_eq!(config.api_base_url, "https://api.telegram.org");
        assert_eq!(config.parse_mode, ParseMode::Html);
        assert_eq!(config.name, "telegram");
        assert!(config.chat_ids.is_empty());
    }

    #[test]
    fn deserializes_from_toml() {
        let config: TelegramConfig = toml::from_str(
            r#"
            token = "123:abc"
            chat_ids = [-100123, 42]
            parse_mode = "MarkdownV2"
            continue_on_err = true
            "#,
        )
        .unwrap();
        assert_eq!(config.chat_ids, [-100_123, 42]);
        assert_eq!(config.parse_mode, ParseMode::MarkdownV2);
        assert!(config.continue_on_err);
        assert!(!config.dry_run);
    }

    #[test]
    fn parse_mode_wire_names() {
        assert_eq!(ParseMode::Html.as_str(), "HTML");
        assert_eq!(
            serde_json::to_value(ParseMode::Markdown).unwrap(),
            serde_json::json!("Markdown")
        );
    }

    #[test]
    fn debug_redacts_token() {
        let debug = format!("{:?}", TelegramConfig::new("123:very-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("very-secret"));
    }
}
