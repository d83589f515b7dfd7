use std::collections::BTreeMap;

use herald_core::{SendConfig, SendContext, SendOption};
use herald_service::fanout::{self, Prepared};
use herald_service::http::{check_response, default_client};
use herald_service::{DeliveryError, NotifyError, Recipients, Service, ServiceSettings};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Request, Response};
use tracing::{debug, instrument};

use crate::config::{Webhook, WebhookConfig};
use crate::error::{HookError, WebhookError};

type PreSendHook = Box<dyn Fn(&mut Request) -> Result<(), HookError> + Send + Sync>;
type PostSendHook = Box<dyn Fn(&Webhook, &Response) -> Result<(), HookError> + Send + Sync>;

/// Webhook-specific send settings.
#[derive(Debug, Clone, Default)]
pub struct WebhookExtra {
    /// Headers added to every webhook for this call, after the webhook's own.
    pub headers: BTreeMap<String, String>,
}

/// Add a header to every request of this call.
pub fn header(name: impl Into<String>, value: impl Into<String>) -> SendOption {
    let (name, value) = (name.into(), value.into());
    SendOption::custom(move |extra: &mut WebhookExtra| {
        extra.headers.insert(name.clone(), value.clone());
    })
}

/// Default renderer: `{"subject": ..., "message": ...}`.
///
/// Renders nothing when both parts are empty so the send is skipped.
pub fn json_payload<X>(config: &SendConfig<X>) -> String {
    if config.subject.is_empty() && config.message.is_empty() {
        return String::new();
    }
    serde_json::json!({
        "subject": config.subject,
        "message": config.message,
    })
    .to_string()
}

/// Generic HTTP webhook service.
///
/// The rendered message is the request body, sent unchanged to every
/// webhook in order. Attachments are not supported and are ignored.
pub struct WebhookService {
    user_agent: String,
    settings: ServiceSettings<WebhookExtra>,
    webhooks: Recipients<Webhook>,
    pre_send_hooks: Vec<PreSendHook>,
    post_send_hooks: Vec<PostSendHook>,
    client: Client,
}

impl std::fmt::Debug for WebhookService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookService")
            .field("settings", &self.settings)
            .field("webhooks", &self.webhooks.len())
            .field("pre_send_hooks", &self.pre_send_hooks.len())
            .field("post_send_hooks", &self.post_send_hooks.len())
            .finish_non_exhaustive()
    }
}

impl WebhookService {
    pub fn new(config: WebhookConfig) -> Self {
        Self::with_client(config, default_client())
    }

    /// Create a new webhook service with a custom HTTP client.
    pub fn with_client(config: WebhookConfig, client: Client) -> Self {
        let webhooks = Recipients::new(config.recipients());
        let settings = ServiceSettings::new(config.name, WebhookExtra::default(), json_payload)
            .with_dry_run(config.dry_run)
            .with_continue_on_err(config.continue_on_err);
        Self {
            user_agent: config.user_agent,
            settings,
            webhooks,
            pre_send_hooks: Vec::new(),
            post_send_hooks: Vec::new(),
            client,
        }
    }

    /// Replace the body renderer.
    #[must_use]
    pub fn with_renderer(
        mut self,
        renderer: impl Fn(&SendConfig<WebhookExtra>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.settings = self.settings.with_renderer(renderer);
        self
    }

    /// Run `hook` on every request after it is built and before it is sent.
    /// Hooks run in registration order, also in dry run.
    #[must_use]
    pub fn with_pre_send_hook(
        mut self,
        hook: impl Fn(&mut Request) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        self.pre_send_hooks.push(Box::new(hook));
        self
    }

    /// Run `hook` on every response before its status is checked.
    #[must_use]
    pub fn with_post_send_hook(
        mut self,
        hook: impl Fn(&Webhook, &Response) -> Result<(), HookError> + Send + Sync + 'static,
    ) -> Self {
        self.post_send_hooks.push(Box::new(hook));
        self
    }

    pub fn add_recipients(&self, webhooks: impl IntoIterator<Item = Webhook>) {
        self.webhooks.add(webhooks);
    }

    /// Add plain URLs as default `POST` JSON webhooks.
    pub fn add_recipient_urls(&self, urls: impl IntoIterator<Item = impl Into<String>>) {
        self.webhooks.add(urls.into_iter().map(Webhook::new));
    }

    fn headers(&self, webhook: &Webhook, extra: &WebhookExtra) -> Result<HeaderMap, WebhookError> {
        let mut headers = HeaderMap::new();
        for (name, value) in webhook.headers.iter().chain(&extra.headers) {
            let invalid = |reason: String| WebhookError::InvalidHeader {
                name: name.clone(),
                reason,
            };
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            headers.insert(header_name, header_value);
        }

        let defaults = [
            (USER_AGENT, self.user_agent.as_str()),
            (CONTENT_TYPE, webhook.content_type.as_str()),
        ];
        for (name, value) in defaults {
            if value.is_empty() || headers.contains_key(&name) {
                continue;
            }
            let value = HeaderValue::from_str(value).map_err(|e| WebhookError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    fn build_request(
        &self,
        webhook: &Webhook,
        config: &SendConfig<WebhookExtra>,
    ) -> Result<Request, WebhookError> {
        let mut request = self
            .client
            .request(webhook.method.to_reqwest(), &webhook.url)
            .headers(self.headers(webhook, &config.extra)?)
            .body(config.message.clone())
            .build()?;
        for hook in &self.pre_send_hooks {
            hook(&mut request).map_err(WebhookError::PreSendHook)?;
        }
        Ok(request)
    }

    async fn send_to(
        &self,
        webhook: &Webhook,
        config: &SendConfig<WebhookExtra>,
    ) -> Result<(), WebhookError> {
        let request = self.build_request(webhook, config)?;
        if config.dry_run {
            fanout::log_dry_run(self.settings.name(), webhook, "request");
            return Ok(());
        }

        debug!(webhook = %webhook, "dispatching webhook");
        let response = self.client.execute(request).await?;
        for hook in &self.post_send_hooks {
            hook(webhook, &response).map_err(WebhookError::PostSendHook)?;
        }
        check_response(response).await?;
        Ok(())
    }
}

impl Service for WebhookService {
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
        let webhooks = self.webhooks.snapshot();
        let config = match fanout::prepare(&self.settings, &webhooks, subject, message, options)? {
            Prepared::Skip => return Ok(()),
            Prepared::Ready(config) => config,
        };
        if !config.attachments.is_empty() {
            debug!(
                count = config.attachments.len(),
                "webhooks do not carry attachments, ignoring them"
            );
        }
        let config = &config;

        fanout::deliver(
            ctx,
            self.settings.name(),
            &webhooks,
            config.continue_on_err,
            |webhook| async move {
                self.send_to(&webhook, config)
                    .await
                    .map_err(DeliveryError::from)
            },
        )
        .await
    }
}
