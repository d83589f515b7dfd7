use herald_core::{Attachment, SendConfig, SendContext, SendOption, render};
use herald_service::fanout::{self, Prepared};
use herald_service::http::{check_response, default_client};
use herald_service::{DeliveryError, NotifyError, Recipients, Service, ServiceSettings};
use reqwest::{Client, Request, RequestBuilder};
use tracing::{debug, instrument};

use crate::config::{NtfyConfig, ParseMode, Priority};
use crate::error::NtfyError;
use crate::types::PublishRequest;

/// ntfy-specific send settings. Each field has a matching option function.
#[derive(Debug, Clone, Default)]
pub struct NtfyExtra {
    pub parse_mode: ParseMode,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub icon: Option<String>,
    pub delay: Option<String>,
    pub click_action: Option<String>,
}

pub fn parse_mode(mode: ParseMode) -> SendOption {
    SendOption::custom(move |extra: &mut NtfyExtra| extra.parse_mode = mode)
}

pub fn priority(priority: Priority) -> SendOption {
    SendOption::custom(move |extra: &mut NtfyExtra| extra.priority = priority)
}

/// Replace the configured tags for this call.
pub fn tags(tags: impl IntoIterator<Item = impl Into<String>>) -> SendOption {
    let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
    SendOption::custom(move |extra: &mut NtfyExtra| extra.tags.clone_from(&tags))
}

pub fn icon(url: impl Into<String>) -> SendOption {
    let url = url.into();
    SendOption::custom(move |extra: &mut NtfyExtra| extra.icon = Some(url.clone()))
}

/// Schedule delivery, e.g. `delay("30m")`.
pub fn delay(delay: impl Into<String>) -> SendOption {
    let delay = delay.into();
    SendOption::custom(move |extra: &mut NtfyExtra| extra.delay = Some(delay.clone()))
}

pub fn click_action(url: impl Into<String>) -> SendOption {
    let url = url.into();
    SendOption::custom(move |extra: &mut NtfyExtra| extra.click_action = Some(url.clone()))
}

/// ntfy service publishing to topics.
///
/// The message is published as JSON to the server root with the subject as
/// title. Attachments follow, each `PUT` to `{base}/{topic}` with a
/// `Filename` header.
pub struct NtfyService {
    token: String,
    api_base_url: String,
    settings: ServiceSettings<NtfyExtra>,
    topics: Recipients<String>,
    client: Client,
}

impl NtfyService {
    pub fn new(config: NtfyConfig) -> Self {
        Self::with_client(config, default_client())
    }

    pub fn with_client(config: NtfyConfig, client: Client) -> Self {
        let extra = NtfyExtra {
            parse_mode: config.parse_mode,
            priority: config.priority,
            tags: config.tags,
            icon: config.icon,
            delay: config.delay,
            click_action: config.click_action,
        };
        let settings = ServiceSettings::new(config.name, extra, render::message_only)
            .with_dry_run(config.dry_run)
            .with_continue_on_err(config.continue_on_err);
        Self {
            token: config.token,
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            settings,
            topics: Recipients::new(config.topics),
            client,
        }
    }

    #[must_use]
    pub fn with_renderer(
        mut self,
        renderer: impl Fn(&SendConfig<NtfyExtra>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.settings = self.settings.with_renderer(renderer);
        self
    }

    pub fn add_recipients(&self, topics: impl IntoIterator<Item = impl Into<String>>) {
        self.topics.add(topics.into_iter().map(Into::into));
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        if self.token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.token)
        }
    }

    fn publish_request(topic: &str, config: &SendConfig<NtfyExtra>) -> PublishRequest {
        let extra = &config.extra;
        PublishRequest {
            topic: topic.to_owned(),
            title: config.subject.clone(),
            message: config.message.clone(),
            tags: extra.tags.clone(),
            priority: extra.priority.as_u8(),
            markdown: extra.parse_mode == ParseMode::Markdown,
            click: extra.click_action.clone(),
            icon: extra.icon.clone(),
            delay: extra.delay.clone(),
        }
    }

    async fn send_to_topic(
        &self,
        topic: &str,
        config: &SendConfig<NtfyExtra>,
    ) -> Result<(), NtfyError> {
        if !config.message.is_empty() {
            let request = self
                .authorize(self.client.post(&self.api_base_url))
                .json(&Self::publish_request(topic, config))
                .build()?;
            if config.dry_run {
                fanout::log_dry_run(self.settings.name(), &topic, "message");
            } else {
                debug!(topic, "publishing message");
                check_response(self.client.execute(request).await?).await?;
            }
        }

        for attachment in &config.attachments {
            let request = self.file_request(topic, attachment)?;
            if config.dry_run {
                fanout::log_dry_run(self.settings.name(), &topic, attachment.name());
                continue;
            }
            debug!(topic, file = attachment.name(), "uploading file");
            check_response(self.client.execute(request).await?).await?;
        }
        Ok(())
    }

    fn file_request(&self, topic: &str, attachment: &Attachment) -> Result<Request, NtfyError> {
        let mut builder = self
            .authorize(self.client.put(format!("{}/{topic}", self.api_base_url)))
            .header("Filename", attachment.name())
            .body(attachment.data());
        if !attachment.content_type().is_empty() {
            builder = builder.header(reqwest::header::CONTENT_TYPE, attachment.content_type());
        }
        Ok(builder.build()?)
    }
}

impl Service for NtfyService {
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
        let topics = self.topics.snapshot();
        let config = match fanout::prepare(&self.settings, &topics, subject, message, options)? {
            Prepared::Skip => return Ok(()),
            Prepared::Ready(config) => config,
        };
        let config = &config;

        fanout::deliver(
            ctx,
            self.settings.name(),
            &topics,
            config.continue_on_err,
            |topic| async move {
                self.send_to_topic(&topic, config)
                    .await
                    .map_err(DeliveryError::from)
            },
        )
        .await
    }
}
