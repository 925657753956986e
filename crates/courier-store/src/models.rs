use serde::{Deserialize, Serialize};

/// One conversation. Timestamps are RFC3339 UTC strings, so their
/// lexicographic order is their chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub model: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub message_count: i64,
    pub archived: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Image,
    Audio,
    Video,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "image" => Self::Image,
            "audio" => Self::Audio,
            "video" => Self::Video,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub session_id: String,
    pub role: String,
    pub content: String,
    pub content_type: ContentType,
    pub media_data: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub created_at: String,
}

/// Insert payload for one message row.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub role: String,
    pub content: String,
    pub content_type: ContentType,
    pub media_data: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
}

/// Full-text-ish search hit joined with its session title.
#[derive(Debug, Clone, Serialize)]
pub struct MessageHit {
    pub id: i64,
    pub session_id: String,
    pub session_title: String,
    pub role: String,
    pub content: String,
    pub content_type: ContentType,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total_sessions: i64,
    pub total_messages: i64,
    pub today_sessions: i64,
    pub today_messages: i64,
}
