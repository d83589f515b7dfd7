use herald_core::{SendConfig, SendContext, SendOption, render};
use herald_service::fanout::{self, Prepared};
use herald_service::http::{check_response, default_client};
use herald_service::{DeliveryError, NotifyError, Recipients, Service, ServiceSettings};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use crate::config::{AuthMode, DiscordConfig};
use crate::error::DiscordError;
use crate::types::{AttachmentRef, MessageRequest};

/// Discord-specific send settings.
#[derive(Debug, Clone, Default)]
pub struct DiscordExtra {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// Per-call username override. Only honored by webhooks.
pub fn username(name: impl Into<String>) -> SendOption {
    let name = name.into();
    SendOption::custom(move |extra: &mut DiscordExtra| extra.username = Some(name.clone()))
}

/// Per-call avatar override. Only honored by webhooks.
pub fn avatar_url(url: impl Into<String>) -> SendOption {
    let url = url.into();
    SendOption::custom(move |extra: &mut DiscordExtra| extra.avatar_url = Some(url.clone()))
}

/// Discord service posting to channels through the REST API, or to
/// webhook URLs.
pub struct DiscordService {
    auth: AuthMode,
    authorization: Option<String>,
    api_base_url: String,
    settings: ServiceSettings<DiscordExtra>,
    recipients: Recipients<String>,
    client: Client,
}

impl DiscordService {
    /// Create a new Discord service with the given configuration.
    pub fn new(config: DiscordConfig) -> Self {
        Self::with_client(config, default_client())
    }

    /// Create a new Discord service with a custom HTTP client.
    pub fn with_client(config: DiscordConfig, client: Client) -> Self {
        let authorization = if config.token.is_empty() {
            None
        } else {
            config.authorization()
        };
        let extra = DiscordExtra {
            username: config.username,
            avatar_url: config.avatar_url,
        };
        let settings = ServiceSettings::new(config.name, extra, render::subject_and_message)
            .with_dry_run(config.dry_run)
            .with_continue_on_err(config.continue_on_err);
        Self {
            auth: config.auth,
            authorization,
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            settings,
            recipients: Recipients::new(config.recipients),
            client,
        }
    }

    /// Replace the message renderer.
    #[must_use]
    pub fn with_renderer(
        mut self,
        renderer: impl Fn(&SendConfig<DiscordExtra>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.settings = self.settings.with_renderer(renderer);
        self
    }

    /// Add channel IDs, or webhook URLs in webhook mode.
    pub fn add_recipients(&self, recipients: impl IntoIterator<Item = impl Into<String>>) {
        self.recipients.add(recipients.into_iter().map(Into::into));
    }

    fn target_url(&self, recipient: &str) -> Result<Url, DiscordError> {
        let raw = match self.auth {
            AuthMode::Webhook => recipient.to_owned(),
            AuthMode::Bot | AuthMode::Bearer => {
                if recipient.is_empty() || !recipient.chars().all(|c| c.is_ascii_digit()) {
                    return Err(DiscordError::InvalidRecipient(format!(
                        "channel ID must be numeric: {recipient:?}"
                    )));
                }
                format!("{}/channels/{recipient}/messages", self.api_base_url)
            }
        };
        Url::parse(&raw).map_err(|e| DiscordError::InvalidRecipient(format!("{raw}: {e}")))
    }

    fn build_request(config: &SendConfig<DiscordExtra>) -> MessageRequest {
        MessageRequest {
            content: config.message.clone(),
            username: config.extra.username.clone(),
            avatar_url: config.extra.avatar_url.clone(),
            attachments: config
                .attachments
                .iter()
                .enumerate()
                .map(|(id, a)| AttachmentRef {
                    id,
                    filename: a.name().to_owned(),
                })
                .collect(),
        }
    }

    fn build_form(
        request: &MessageRequest,
        config: &SendConfig<DiscordExtra>,
    ) -> Result<Form, DiscordError> {
        let payload = serde_json::to_string(request)
            .map_err(|e| DiscordError::InvalidPayload(e.to_string()))?;
        let mut form = Form::new().text("payload_json", payload);
        for (i, attachment) in config.attachments.iter().enumerate() {
            let mut part = Part::stream_with_length(attachment.data(), attachment.size() as u64)
                .file_name(attachment.name().to_owned());
            if !attachment.content_type().is_empty() {
                part = part.mime_str(attachment.content_type()).map_err(|e| {
                    DiscordError::InvalidPayload(format!("invalid content type: {e}"))
                })?;
            }
            form = form.part(format!("files[{i}]"), part);
        }
        Ok(form)
    }

    async fn send_to(
        &self,
        recipient: &str,
        config: &SendConfig<DiscordExtra>,
    ) -> Result<(), DiscordError> {
        let url = self.target_url(recipient)?;
        let request = Self::build_request(config);
        let form = if config.attachments.is_empty() {
            None
        } else {
            Some(Self::build_form(&request, config)?)
        };

        if config.dry_run {
            fanout::log_dry_run(self.settings.name(), &recipient, "message");
            return Ok(());
        }

        debug!(files = config.attachments.len(), "posting message to Discord");
        let mut builder = self.client.post(url);
        if let Some(auth) = &self.authorization {
            builder = builder.header(reqwest::header::AUTHORIZATION, auth);
        }
        let builder = match form {
            Some(form) => builder.multipart(form),
            None => builder.json(&request),
        };
        let response = builder.send().await?;
        check_response(response).await?;
        Ok(())
    }
}

impl Service for DiscordService {
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
        if self.auth != AuthMode::Webhook && self.authorization.is_none() {
            return Err(NotifyError::Configuration(
                "discord: token is required unless auth = \"webhook\"".into(),
            ));
        }

        let recipients = self.recipients.snapshot();
        let prepared = fanout::prepare(&self.settings, &recipients, subject, message, options)?;
        let config = match prepared {
            Prepared::Skip => return Ok(()),
            Prepared::Ready(config) => config,
        };
        let config = &config;

        fanout::deliver(
            ctx,
            self.settings.name(),
            &recipients,
            config.continue_on_err,
            |recipient| async move {
                self.send_to(&recipient, config)
                    .await
                    .map_err(DeliveryError::from)
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use herald_core::{Attachment, with_attachments, with_dry_run};
    use herald_simulation::MockHttpServer;

    use super::*;

    async fn bot(channels: &[&str]) -> (MockHttpServer, DiscordService) {
        let server = MockHttpServer::start().await.unwrap();
        let config = DiscordConfig::bot("tok")
            .with_recipients(channels.iter().copied())
            .with_api_base_url(server.base_url());
        (server, DiscordService::new(config))
    }

    #[tokio::test]
    async fn bot_mode_posts_to_channel_endpoint() {
        let (server, service) = bot(&["111", "222"]).await;

        Service::send(&service, &SendContext::new(), "Alert", "disk full", &[])
            .await
            .unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "/channels/111/messages");
        assert_eq!(requests[0].header("authorization"), Some("Bot tok"));
        assert_eq!(requests[0].json().unwrap()["content"], "Alert\n\ndisk full");
        assert_eq!(requests[1].path, "/channels/222/messages");
    }

    #[tokio::test]
    async fn webhook_mode_posts_to_recipient_url_without_auth() {
        let server = MockHttpServer::start().await.unwrap();
        let service = DiscordService::new(
            DiscordConfig::webhook()
                .with_recipients([server.url("/api/webhooks/1/abc")])
                .with_username("Herald"),
        );

        Service::send(
            &service,
            &SendContext::new(),
            "",
            "hello",
            &[avatar_url("https://example.com/a.png")],
        )
        .await
        .unwrap();

        let requests = server.requests();
        assert_eq!(requests[0].path, "/api/webhooks/1/abc");
        assert!(requests[0].header("authorization").is_none());
        let body = requests[0].json().unwrap();
        assert_eq!(body["content"], "hello");
        assert_eq!(body["username"], "Herald");
        assert_eq!(body["avatar_url"], "https://example.com/a.png");
    }

    #[tokio::test]
    async fn attachments_are_sent_as_multipart() {
        let (server, service) = bot(&["111"]).await;
        let file = Attachment::from_bytes(&b"log line"[..], "app.log", "text/plain", false);

        Service::send(
            &service,
            &SendContext::new(),
            "",
            "see attached",
            &[with_attachments([file])],
        )
        .await
        .unwrap();

        let request = &server.requests()[0];
        assert!(
            request
                .header("content-type")
                .is_some_and(|ct| ct.starts_with("multipart/form-data"))
        );
        let body = request.body_str();
        assert!(body.contains("name=\"payload_json\""));
        assert!(body.contains("name=\"files[0]\""));
        assert!(body.contains("log line"));
        assert!(body.contains("see attached"));
    }

    #[tokio::test]
    async fn rate_limit_maps_to_retryable_error() {
        let (server, service) = bot(&["111"]).await;
        server.respond_json(429, r#"{"message":"You are being rate limited.","retry_after":1.0}"#);

        let err = Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap_err();
        let cause = err.as_send_error().unwrap().cause_for("111").unwrap();
        assert!(matches!(cause, DeliveryError::RateLimited(_)));
        assert!(cause.is_retryable());
    }

    #[tokio::test]
    async fn invalid_webhook_url_fails_without_request() {
        let service =
            DiscordService::new(DiscordConfig::webhook().with_recipients(["not a url"]));
        let err = Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_send_error().unwrap().cause_for("not a url"),
            Some(DeliveryError::InvalidPayload(_))
        ));
    }

    #[tokio::test]
    async fn transport_error_cause_omits_the_webhook_url() {
        let webhook = "http://127.0.0.1:1/api/webhooks/1/secret-token";
        let service = DiscordService::new(DiscordConfig::webhook().with_recipients([webhook]));

        let err = Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap_err();

        let cause = err.as_send_error().unwrap().cause_for(webhook).unwrap();
        assert!(matches!(cause, DeliveryError::Connection(_)));
        assert!(!cause.to_string().contains("secret-token"));
    }

    #[tokio::test]
    async fn missing_token_is_a_configuration_error() {
        let service = DiscordService::new(DiscordConfig::bot("").with_recipients(["111"]));
        let err = Service::send(&service, &SendContext::new(), "s", "m", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Configuration(_)));
    }

    #[tokio::test]
    async fn dry_run_makes_no_requests() {
        let (server, service) = bot(&["111"]).await;
        Service::send(&service, &SendContext::new(), "s", "m", &[with_dry_run(true)])
            .await
            .unwrap();
        assert_eq!(server.request_count(), 0);
    }
}
