use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message observed on a monitored channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub channel_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub username: String,
}
