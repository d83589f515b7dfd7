use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Content type sent when a webhook does not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP method to use for the webhook request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Returns the method name as an uppercase string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One webhook recipient.
///
/// Displays as `METHOD url content-type`, which is how failures are
/// attributed. Header values are redacted from `Debug` output since they
/// often carry credentials.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Webhook {
    pub url: String,

    #[serde(default)]
    pub method: HttpMethod,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Extra request headers. A `User-Agent` or `Content-Type` here wins over
    /// the service defaults.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_owned()
}

impl Webhook {
    /// A `POST` webhook sending JSON to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            content_type: default_content_type(),
            headers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Add a header, replacing any earlier value for the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl fmt::Display for Webhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method.as_str(), self.url, self.content_type)
    }
}

impl fmt::Debug for Webhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> =
            self.headers.keys().map(|k| (k.as_str(), "[REDACTED]")).collect();
        f.debug_struct("Webhook")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("content_type", &self.content_type)
            .field("headers", &headers)
            .finish()
    }
}

/// Configuration for the webhook service.
///
/// ```toml
/// urls = ["https://hooks.example.com/plain"]
///
/// [[webhooks]]
/// url = "https://hooks.example.com/signed"
/// method = "PUT"
/// headers = { Authorization = "Bearer abc" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Fully specified webhooks.
    #[serde(default)]
    pub webhooks: Vec<Webhook>,

    /// Plain URLs, each turned into a default `POST` JSON webhook after
    /// [`webhooks`](Self::webhooks).
    #[serde(default)]
    pub urls: Vec<String>,

    #[serde(default = "default_name")]
    pub name: String,

    /// `User-Agent` sent unless a webhook sets its own.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub continue_on_err: bool,
}

fn default_name() -> String {
    "webhook".to_owned()
}

fn default_user_agent() -> String {
    concat!("herald/", env!("CARGO_PKG_VERSION")).to_owned()
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            webhooks: Vec::new(),
            urls: Vec::new(),
            name: default_name(),
            user_agent: default_user_agent(),
            dry_run: false,
            continue_on_err: false,
        }
    }
}

impl WebhookConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every configured recipient, full webhooks first.
    pub fn recipients(&self) -> Vec<Webhook> {
        self.webhooks
            .iter()
            .cloned()
            .chain(self.urls.iter().map(Webhook::new))
            .collect()
    }

    #[must_use]
    pub fn with_webhooks(mut self, webhooks: impl IntoIterator<Item = Webhook>) -> Self {
        self.webhooks = webhooks.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_urls(mut self, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
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
    fn webhook_defaults_to_json_post() {
        let hook = Webhook::new("https://example.com/hook");
        assert_eq!(hook.method, HttpMethod::Post);
        assert_eq!(hook.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(
            hook.to_string(),
            "POST https://example.com/hook application/json; charset=utf-8"
        );
    }

    #[test]
    fn debug_redacts_header_values() {
        let hook =
            Webhook::new("https://example.com").with_header("Authorization", "Bearer s3cr3t");
        let debug = format!("{hook:?}");
        assert!(debug.contains("Authorization"));
        assert!(!debug.contains("s3cr3t"));
    }

    #[test]
    fn urls_follow_full_webhooks() {
        let config = WebhookConfig::new()
            .with_webhooks([Webhook::new("https://a.example").with_method(HttpMethod::Put)])
            .with_urls(["https://b.example"]);
        let recipients = config.recipients();
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0].method, HttpMethod::Put);
        assert_eq!(recipients[1].url, "https://b.example");
        assert_eq!(recipients[1].method, HttpMethod::Post);
    }

    #[test]
    fn deserializes_from_toml_with_defaults() {
        let config: WebhookConfig = toml::from_str(
            r#"
            urls = ["https://hooks.example.com/plain"]

            [[webhooks]]
            url = "https://hooks.example.com/signed"
            method = "PATCH"
            content_type = "text/plain"
            headers = { "X-Token" = "abc" }
            "#,
        )
        .unwrap();
        assert_eq!(config.name, "webhook");
        assert!(config.user_agent.starts_with("herald/"));
        assert_eq!(config.webhooks[0].method, HttpMethod::Patch);
        assert_eq!(config.webhooks[0].content_type, "text/plain");
        assert_eq!(config.webhooks[0].headers["X-Token"], "abc");
        assert_eq!(config.urls, ["https://hooks.example.com/plain"]);
        assert!(!config.dry_run);
    }
}
