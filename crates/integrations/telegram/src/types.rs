use serde::{Deserialize, Serialize};

use crate::config::ParseMode;

/// Request body for the Bot API `sendMessage` method.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: ParseMode,
}

/// Envelope returned by every Bot API method.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    pub error_code: Option<u16>,
    pub description: Option<String>,
}
