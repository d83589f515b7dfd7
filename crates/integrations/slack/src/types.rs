use serde::{Deserialize, Serialize};

// ─── chat.postMessage ────────────────────────────────────────────────

/// Request body for the Slack `chat.postMessage` API.
#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest {
    /// Target channel, DM, or group ID.
    pub channel: String,

    pub text: String,
}

// ─── API Responses ───────────────────────────────────────────────────

/// Envelope returned by all Slack Web API methods.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,

    /// Error code when `ok` is `false`.
    pub error: Option<String>,
}

// ─── files.getUploadURLExternal ──────────────────────────────────────

/// Form fields for the Slack `files.getUploadURLExternal` API.
#[derive(Debug, Clone, Serialize)]
pub struct GetUploadUrlRequest {
    pub filename: String,
    /// Length of the file in bytes.
    pub length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetUploadUrlResponse {
    pub ok: bool,
    pub error: Option<String>,
    /// Presigned URL to upload the file data to.
    pub upload_url: Option<String>,
    /// Opaque file ID used to complete the upload.
    pub file_id: Option<String>,
}

// ─── files.completeUploadExternal ────────────────────────────────────

/// Request body for the Slack `files.completeUploadExternal` API.
#[derive(Debug, Clone, Serialize)]
pub struct CompleteUploadRequest {
    pub files: Vec<FileReference>,
    /// Channel to share the file in.
    pub channel_id: String,
    /// Message posted alongside the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_comment: Option<String>,
}

/// A file being completed, by the ID returned from `getUploadURLExternal`.
#[derive(Debug, Clone, Serialize)]
pub struct FileReference {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_upload_omits_missing_comment() {
        let req = CompleteUploadRequest {
            files: vec![FileReference {
                id: "F1".into(),
                title: Some("report.pdf".into()),
            }],
            channel_id: "C1".into(),
            initial_comment: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["files"][0]["id"], "F1");
        assert_eq!(json["channel_id"], "C1");
        assert!(json.get("initial_comment").is_none());
    }

    #[test]
    fn api_response_deserializes_error() {
        let resp: ApiResponse =
            serde_json::from_str(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("channel_not_found"));
    }

    #[test]
    fn upload_url_response_deserializes() {
        let resp: GetUploadUrlResponse = serde_json::from_str(
            r#"{"ok": true, "upload_url": "https://files.slack.com/u/1", "file_id": "F9"}"#,
        )
        .unwrap();
        assert_eq!(resp.file_id.as_deref(), Some("F9"));
    }
}
