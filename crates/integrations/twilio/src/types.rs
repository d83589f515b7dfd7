use serde::{Deserialize, Serialize};

/// Form-encoded request body for the Twilio Messages API.
///
/// Twilio expects `application/x-www-form-urlencoded` rather than JSON.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    /// Destination phone number in E.164 format.
    #[serde(rename = "To")]
    pub to: String,

    #[serde(rename = "From")]
    pub from: String,

    #[serde(rename = "Body")]
    pub body: String,
}

/// Response from the Twilio Messages API.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    /// Message SID (unique identifier).
    pub sid: Option<String>,

    /// Message status (e.g., `"queued"`, `"sent"`, `"delivered"`).
    pub status: Option<String>,

    /// Twilio error code (present on failure).
    pub error_code: Option<i32>,

    pub error_message: Option<String>,
}
