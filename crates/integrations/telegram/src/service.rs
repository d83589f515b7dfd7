use herald_core::{Attachment, SendConfig, SendContext, SendOption, render};
use herald_service::fanout::{self, Prepared};
use herald_service::http::{check_response, default_client};
use herald_service::{DeliveryError, NotifyError, Recipients, Service, ServiceSettings};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};

use crate::config::{ParseMode, TelegramConfig};
use crate::error::TelegramError;
use crate::types::{ApiResponse, SendMessageRequest};

/// Telegram-specific send settings.
#[derive(Debug, Clone, Default)]
pub struct TelegramExtra {
    pub parse_mode: ParseMode,
}

/// Per-call override of [`TelegramConfig::parse_mode`].
pub fn parse_mode(mode: ParseMode) -> SendOption {
    SendOption::custom(move |extra: &mut TelegramExtra| extra.parse_mode = mode)
}

/// Telegram service that talks to the Bot API.
///
/// Text goes out with `sendMessage`. With attachments every file is sent via
/// `sendDocument` and the message becomes the caption of the first one.
pub struct TelegramService {
    token: String,
    api_base_url: String,
    settings: ServiceSettings<TelegramExtra>,
    chat_ids: Recipients<i64>,
    client: Client,
}

impl TelegramService {
    pub fn new(config: TelegramConfig) -> Self {
        Self::with_client(config, default_client())
    }

    pub fn with_client(config: TelegramConfig, client: Client) -> Self {
        let extra = TelegramExtra {
            parse_mode: config.parse_mode,
        };
        let settings = ServiceSettings::new(config.name, extra, render::subject_and_message)
            .with_dry_run(config.dry_run)
            .with_continue_on_err(config.continue_on_err);
        Self {
            token: config.token,
            api_base_url: config.api_base_url,
            settings,
            chat_ids: Recipients::new(config.chat_ids),
            client,
        }
    }

    #[must_use]
    pub fn with_renderer(
        mut self,
        renderer: impl Fn(&SendConfig<TelegramExtra>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.settings = self.settings.with_renderer(renderer);
        self
    }

    pub fn add_recipients(&self, chat_ids: impl IntoIterator<Item = i64>) {
        self.chat_ids.add(chat_ids);
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base_url, self.token)
    }

    async fn send_to_chat(
        &self,
        chat_id: i64,
        config: &SendConfig<TelegramExtra>,
    ) -> Result<(), TelegramError> {
        if config.attachments.is_empty() {
            let request = SendMessageRequest {
                chat_id,
                text: config.message.clone(),
                parse_mode: config.extra.parse_mode,
            };
            if config.dry_run {
                fanout::log_dry_run(self.settings.name(), &chat_id, "sendMessage");
                return Ok(());
            }
            debug!(chat_id, "sending text message to chat");
            let response = self
                .client
                .post(self.method_url("sendMessage"))
                .json(&request)
                .send()
                .await?;
            return ok_or_api_error(check_response(response).await?.json().await?);
        }

        for (idx, attachment) in config.attachments.iter().enumerate() {
            let caption =
                (idx == 0 && !config.message.is_empty()).then_some(config.message.as_str());
            let form = document_form(chat_id, attachment, caption, config.extra.parse_mode)?;
            if config.dry_run {
                fanout::log_dry_run(self.settings.name(), &chat_id, attachment.name());
                continue;
            }
            debug!(chat_id, file = attachment.name(), "sending file to chat");
            let response = self
                .client
                .post(self.method_url("sendDocument"))
                .multipart(form)
                .send()
                .await?;
            ok_or_api_error(check_response(response).await?.json().await?)?;
        }
        Ok(())
    }
}

fn document_form(
    chat_id: i64,
    attachment: &Attachment,
    caption: Option<&str>,
    parse_mode: ParseMode,
) -> Result<Form, TelegramError> {
    let mut part = Part::stream_with_length(attachment.data(), attachment.size() as u64)
        .file_name(attachment.name().to_owned());
    if !attachment.content_type().is_empty() {
        part = part
            .mime_str(attachment.content_type())
            .map_err(|e| TelegramError::InvalidPayload(format!("invalid content type: {e}")))?;
    }
    let mut form = Form::new()
        .text("chat_id", chat_id.to_string())
        .part("document", part);
    if let Some(caption) = caption {
        form = form
            .text("caption", caption.to_owned())
            .text("parse_mode", parse_mode.as_str());
    }
    Ok(form)
}

fn ok_or_api_error(response: ApiResponse) -> Result<(), TelegramError> {
    if response.ok {
        return Ok(());
    }
    Err(TelegramError::Api {
        code: response.error_code.unwrap_or(400),
        description: response
            .description
            .unwrap_or_else(|| "unknown error".to_owned()),
    })
}

impl Service for TelegramService {
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
        let chat_ids = self.chat_ids.snapshot();
        let config = match fanout::prepare(&self.settings, &chat_ids, subject, message, options)? {
            Prepared::Skip => return Ok(()),
            Prepared::Ready(config) => config,
        };
        let config = &config;

        fanout::deliver(
            ctx,
            self.settings.name(),
            &chat_ids,
            config.continue_on_err,
            |chat_id| async move {
                self.send_to_chat(chat_id, config)
                    .await
                    .map_err(DeliveryError::from)
            },
        )
        .await
    }
}
