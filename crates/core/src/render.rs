//! Stock message renderers.

use crate::config::SendConfig;

/// Subject and message separated by a blank line.
///
/// Empty parts are skipped, so an empty subject yields just the message and
/// an empty subject plus empty message yields an empty string (which trips
/// the empty-payload guard instead of sending a blank notification).
pub fn subject_and_message<X>(config: &SendConfig<X>) -> String {
    match (config.subject.is_empty(), config.message.is_empty()) {
        (true, _) => config.message.clone(),
        (false, true) => config.subject.clone(),
        (false, false) => format!("{}\n\n{}", config.subject, config.message),
    }
}

/// The message text as-is. Used by backends that carry the subject separately
/// (email, ntfy titles).
pub fn message_only<X>(config: &SendConfig<X>) -> String {
    config.message.clone()
}
