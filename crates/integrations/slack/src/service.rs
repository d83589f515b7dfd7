use herald_core::{Attachment, SendConfig, SendContext, SendOption, render};
use herald_service::fanout::{self, Prepared};
use herald_service::http::{check_response, default_client};
use herald_service::{DeliveryError, NotifyError, Recipients, Service, ServiceSettings};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};

use crate::config::SlackConfig;
use crate::error::SlackError;
use crate::types::{
    ApiResponse, CompleteUploadRequest, FileReference, GetUploadUrlRequest, GetUploadUrlResponse,
    PostMessageRequest,
};

/// Slack-specific send settings, adjustable per call with [`escape_message`].
#[derive(Debug, Clone, Default)]
pub struct SlackExtra {
    pub escape_message: bool,
}

/// Per-call override of [`SlackConfig::escape_message`].
pub fn escape_message(escape: bool) -> SendOption {
    SendOption::custom(move |extra: &mut SlackExtra| extra.escape_message = escape)
}

/// Slack service that posts messages via the Slack Web API.
///
/// Each channel gets either a `chat.postMessage` call or, when attachments
/// are present, one upload per file with the message as the first file's
/// comment.
pub struct SlackService {
    token: String,
    api_base_url: String,
    settings: ServiceSettings<SlackExtra>,
    channels: Recipients<String>,
    client: Client,
}

impl SlackService {
    /// Create a new Slack service with the given configuration.
    ///
    /// Uses a default `reqwest::Client` with a 30 second timeout.
    pub fn new(config: SlackConfig) -> Self {
        Self::with_client(config, default_client())
    }

    /// Create a new Slack service with a custom HTTP client.
    ///
    /// Useful for testing or for sharing a connection pool across services.
    pub fn with_client(config: SlackConfig, client: Client) -> Self {
        let extra = SlackExtra {
            escape_message: config.escape_message,
        };
        let settings = ServiceSettings::new(config.name, extra, render::subject_and_message)
            .with_dry_run(config.dry_run)
            .with_continue_on_err(config.continue_on_err);
        Self {
            token: config.token,
            api_base_url: config.api_base_url,
            settings,
            channels: Recipients::new(config.channels),
            client,
        }
    }

    /// Replace the message renderer.
    #[must_use]
    pub fn with_renderer(
        mut self,
        renderer: impl Fn(&SendConfig<SlackExtra>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.settings = self.settings.with_renderer(renderer);
        self
    }

    /// Add channel IDs to the recipient list.
    pub fn add_recipients(&self, channels: impl IntoIterator<Item = impl Into<String>>) {
        self.channels.add(channels.into_iter().map(Into::into));
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base_url)
    }

    async fn send_to_channel(
        &self,
        channel: &str,
        config: &SendConfig<SlackExtra>,
    ) -> Result<(), SlackError> {
        let text = if config.extra.escape_message {
            escape(&config.message)
        } else {
            config.message.clone()
        };

        if config.attachments.is_empty() {
            let request = PostMessageRequest {
                channel: channel.to_owned(),
                text,
            };
            if config.dry_run {
                fanout::log_dry_run(self.settings.name(), &channel, "chat.postMessage");
                return Ok(());
            }
            return self.post_message(&request).await;
        }

        let mut comment = (!text.is_empty()).then_some(text);
        for attachment in &config.attachments {
            let initial_comment = comment.take();
            let part = file_part(attachment)?;
            if config.dry_run {
                fanout::log_dry_run(self.settings.name(), &channel, attachment.name());
                continue;
            }
            self.upload_file(channel, attachment, part, initial_comment).await?;
        }
        Ok(())
    }

    async fn post_message(&self, request: &PostMessageRequest) -> Result<(), SlackError> {
        debug!(channel = %request.channel, "posting message to Slack");

        let response = self
            .client
            .post(self.api_url("chat.postMessage"))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;
        let response = check_response(response).await?;
        ok_or_api_error(response.json::<ApiResponse>().await?)
    }

    /// Upload one file using the three-step external upload flow and share
    /// it to `channel`.
    async fn upload_file(
        &self,
        channel: &str,
        attachment: &Attachment,
        part: Part,
        initial_comment: Option<String>,
    ) -> Result<(), SlackError> {
        debug!(channel, file = attachment.name(), "uploading file to Slack");

        // Step 1: obtain a presigned upload URL.
        let request = GetUploadUrlRequest {
            filename: attachment.name().to_owned(),
            length: attachment.size(),
        };
        let response = self
            .client
            .post(self.api_url("files.getUploadURLExternal"))
            .bearer_auth(&self.token)
            .form(&request)
            .send()
            .await?;
        let upload: GetUploadUrlResponse = check_response(response).await?.json().await?;
        if !upload.ok {
            return Err(SlackError::Api(
                upload.error.unwrap_or_else(|| "unknown_error".to_owned()),
            ));
        }
        let (Some(upload_url), Some(file_id)) = (upload.upload_url, upload.file_id) else {
            return Err(SlackError::Api(
                "files.getUploadURLExternal returned no upload_url or file_id".into(),
            ));
        };

        // Step 2: send the bytes.
        let response = self
            .client
            .post(&upload_url)
            .multipart(Form::new().part("file", part))
            .send()
            .await?;
        check_response(response).await?;

        // Step 3: complete the upload and share it.
        let request = CompleteUploadRequest {
            files: vec![FileReference {
                id: file_id,
                title: Some(attachment.name().to_owned()),
            }],
            channel_id: channel.to_owned(),
            initial_comment,
        };
        let response = self
            .client
            .post(self.api_url("files.completeUploadExternal"))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;
        let response = check_response(response).await?;
        ok_or_api_error(response.json::<ApiResponse>().await?)
    }
}

/// The multipart body for step 2 of the upload flow.
fn file_part(attachment: &Attachment) -> Result<Part, SlackError> {
    let part = Part::stream_with_length(attachment.data(), attachment.size() as u64)
        .file_name(attachment.name().to_owned());
    if attachment.content_type().is_empty() {
        return Ok(part);
    }
    part.mime_str(attachment.content_type())
        .map_err(|e| SlackError::InvalidPayload(format!("invalid content type: {e}")))
}

fn ok_or_api_error(response: ApiResponse) -> Result<(), SlackError> {
    if response.ok {
        Ok(())
    } else {
        Err(SlackError::Api(
            response.error.unwrap_or_else(|| "unknown_error".to_owned()),
        ))
    }
}

/// Escape the characters Slack treats as markup.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

impl Service for SlackService {
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
        let channels = self.channels.snapshot();
        let config = match fanout::prepare(&self.settings, &channels, subject, message, options)? {
            Prepared::Skip => return Ok(()),
            Prepared::Ready(config) => config,
        };
        let config = &config;

        fanout::deliver(
            ctx,
            self.settings.name(),
            &channels,
            config.continue_on_err,
            |channel| async move {
                self.send_to_channel(&channel, config)
                    .await
                    .map_err(DeliveryError::from)
            },
        )
        .await
    }
}
