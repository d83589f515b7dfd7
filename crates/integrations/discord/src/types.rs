use serde::Serialize;

/// Body of a Discord create-message or webhook-execute request.
///
/// Sent as JSON, or as the `payload_json` part of a multipart request when
/// files are attached.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    pub content: String,

    /// Override the webhook's default username. Webhooks only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Override the webhook's default avatar URL. Webhooks only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Metadata for each attached file, index-aligned with the `files[i]`
    /// parts.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

/// Reference from the JSON payload to a `files[i]` multipart part.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentRef {
    pub id: usize,
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_without_optional_fields() {
        let req = MessageRequest {
            content: "hi".into(),
            username: None,
            avatar_url: None,
            attachments: Vec::new(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"content": "hi"}));
    }

    #[test]
    fn attachment_refs_are_listed() {
        let req = MessageRequest {
            content: String::new(),
            username: Some("bot".into()),
            avatar_url: None,
            attachments: vec![AttachmentRef {
                id: 0,
                filename: "a.png".into(),
            }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["attachments"][0]["filename"], "a.png");
        assert_eq!(json["username"], "bot");
    }
}
