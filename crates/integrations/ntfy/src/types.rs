use serde::Serialize;

/// JSON body for publishing to a topic via `POST {base}`.
#[derive(Debug, Clone, Serialize)]
pub struct PublishRequest {
    pub topic: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,

    pub message: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    pub priority: u8,

    pub markdown: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub click: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
}
