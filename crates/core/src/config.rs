use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::attachment::Attachment;

/// Free-form metadata attached to a send call. Opaque to the core; services
/// may read keys they understand.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Function that produces the final message text from a fully-built config.
pub type Renderer<X> = Arc<dyn Fn(&SendConfig<X>) -> String + Send + Sync>;

/// Per-call configuration for one service's send.
///
/// A fresh config is built for every send call: service defaults first, then
/// caller options in order, then a single pass through the service's
/// [`Renderer`]. `X` carries service-specific settings (parse mode, priority,
/// ...) that only that service's [`SendOption::custom`] options can touch.
#[derive(Clone)]
pub struct SendConfig<X = ()> {
    pub subject: String,
    pub message: String,
    pub attachments: Vec<Attachment>,
    pub metadata: Metadata,
    /// Build every request but skip the transport call.
    pub dry_run: bool,
    /// Keep going after a recipient fails and report every failure at the end.
    pub continue_on_err: bool,
    pub extra: X,
}

impl<X: fmt::Debug> fmt::Debug for SendConfig<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendConfig")
            .field("subject", &self.subject)
            .field("message_len", &self.message.len())
            .field("attachments", &self.attachments)
            .field("metadata", &self.metadata)
            .field("dry_run", &self.dry_run)
            .field("continue_on_err", &self.continue_on_err)
            .field("extra", &self.extra)
            .finish()
    }
}

impl<X: 'static> SendConfig<X> {
    /// Create a config with no attachments, no metadata and both flags off.
    pub fn new(subject: impl Into<String>, message: impl Into<String>, extra: X) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
            attachments: Vec::new(),
            metadata: Metadata::new(),
            dry_run: false,
            continue_on_err: false,
            extra,
        }
    }

    /// Apply `options` in order. Later options overwrite earlier ones.
    pub fn apply(&mut self, options: &[SendOption]) {
        for option in options {
            option.apply(self);
        }
    }

    /// Replace the message with the renderer's output.
    pub fn render(&mut self, renderer: &Renderer<X>) {
        self.message = renderer(self);
    }

    /// `true` when there is nothing to deliver: no text and no files.
    pub fn is_empty(&self) -> bool {
        self.message.is_empty() && self.attachments.is_empty()
    }
}

/// A type-erased mutation over a service-specific config extension.
#[derive(Clone)]
pub struct CustomOption {
    target: TypeId,
    target_name: &'static str,
    apply: Arc<dyn Fn(&mut dyn Any) + Send + Sync>,
}

impl CustomOption {
    /// Whether this option mutates extensions of type `X`.
    pub fn targets<X: 'static>(&self) -> bool {
        self.target == TypeId::of::<X>()
    }
}

impl fmt::Debug for CustomOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomOption")
            .field("target", &self.target_name)
            .finish_non_exhaustive()
    }
}

/// One caller-supplied adjustment to a send call.
///
/// Options are passed through the dispatcher untouched and interpreted by
/// each service while it builds its [`SendConfig`]. `Custom` options only
/// affect services whose extension type matches and are ignored everywhere
/// else, so one option list can safely be shared by heterogeneous services.
#[derive(Clone, Debug)]
pub enum SendOption {
    Attachments(Vec<Attachment>),
    Metadata(Metadata),
    DryRun(bool),
    ContinueOnErr(bool),
    Custom(CustomOption),
}

impl SendOption {
    /// Build a service-specific option over extension type `X`.
    pub fn custom<X, F>(f: F) -> Self
    where
        X: 'static,
        F: Fn(&mut X) + Send + Sync + 'static,
    {
        Self::Custom(CustomOption {
            target: TypeId::of::<X>(),
            target_name: std::any::type_name::<X>(),
            apply: Arc::new(move |extra: &mut dyn Any| {
                if let Some(extra) = extra.downcast_mut::<X>() {
                    f(extra);
                }
            }),
        })
    }

    /// Apply this option to `config`.
    pub fn apply<X: 'static>(&self, config: &mut SendConfig<X>) {
        match self {
            Self::Attachments(attachments) => config.attachments.clone_from(attachments),
            Self::Metadata(metadata) => config.metadata.clone_from(metadata),
            Self::DryRun(dry_run) => config.dry_run = *dry_run,
            Self::ContinueOnErr(continue_on_err) => config.continue_on_err = *continue_on_err,
            Self::Custom(custom) => (custom.apply)(&mut config.extra),
        }
    }
}

/// Attach files to the message.
pub fn with_attachments(attachments: impl IntoIterator<Item = Attachment>) -> SendOption {
    SendOption::Attachments(attachments.into_iter().collect())
}

/// Attach metadata to the message.
pub fn with_metadata(metadata: Metadata) -> SendOption {
    SendOption::Metadata(metadata)
}

/// Build requests but do not send them.
pub fn with_dry_run(dry_run: bool) -> SendOption {
    SendOption::DryRun(dry_run)
}

/// Continue with the next recipient after a failure.
pub fn with_continue_on_err(continue_on_err: bool) -> SendOption {
    SendOption::ContinueOnErr(continue_on_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct ChatExtra {
        parse_mode: &'static str,
    }

    #[derive(Debug, Default, PartialEq)]
    struct SmsExtra {
        shortened: bool,
    }

    #[test]
    fn options_apply_in_order_last_writer_wins() {
        let mut config = SendConfig::new("s", "m", ());
        config.apply(&[with_dry_run(true), with_dry_run(false), with_continue_on_err(true)]);
        assert!(!config.dry_run);
        assert!(config.continue_on_err);
    }

    #[test]
    fn attachments_option_replaces_previous_set() {
        let a = Attachment::from_bytes(&b"a"[..], "a.txt", "text/plain", false);
        let b = Attachment::from_bytes(&b"b"[..], "b.txt", "text/plain", false);
        let mut config = SendConfig::new("s", "m", ());
        config.apply(&[with_attachments([a]), with_attachments([b])]);
        assert_eq!(config.attachments.len(), 1);
        assert_eq!(config.attachments[0].name(), "b.txt");
    }

    #[test]
    fn metadata_option_sets_map() {
        let mut metadata = Metadata::new();
        metadata.insert("trace".into(), serde_json::json!("abc"));
        let mut config = SendConfig::new("s", "m", ());
        config.apply(&[with_metadata(metadata)]);
        assert_eq!(config.metadata["trace"], "abc");
    }

    #[test]
    fn custom_option_reaches_matching_extension() {
        let mut config = SendConfig::new("s", "m", ChatExtra::default());
        config.apply(&[SendOption::custom(|x: &mut ChatExtra| x.parse_mode = "HTML")]);
        assert_eq!(config.extra.parse_mode, "HTML");
    }

    #[test]
    fn custom_option_is_ignored_by_other_extensions() {
        let option = SendOption::custom(|x: &mut ChatExtra| x.parse_mode = "HTML");
        let mut config = SendConfig::new("s", "m", SmsExtra::default());
        config.apply(std::slice::from_ref(&option));
        assert_eq!(config.extra, SmsExtra::default());

        let SendOption::Custom(custom) = option else {
            panic!("expected custom option");
        };
        assert!(custom.targets::<ChatExtra>());
        assert!(!custom.targets::<SmsExtra>());
    }

    #[test]
    fn render_overwrites_message() {
        let renderer: Renderer<()> =
            Arc::new(|c: &SendConfig<()>| format!("[{}] {}", c.subject, c.message));
        let mut config = SendConfig::new("alert", "disk full", ());
        config.render(&renderer);
        assert_eq!(config.message, "[alert] disk full");
    }

    #[test]
    fn empty_means_no_text_and_no_files() {
        let mut config = SendConfig::new("", "", ());
        assert!(config.is_empty());

        config.attachments.push(Attachment::from_bytes(Vec::new(), "f", "", false));
        assert!(!config.is_empty());
    }
}
