use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directed, point-to-point message. `project_id` scopes the message to a
/// project channel when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
    #[serde(rename = "senderId")]
    pub sender_id: String,
    #[serde(rename = "receiverId")]
    pub receiver_id: String,
    pub body: String,
    #[serde(rename = "messageType")]
    pub message_type: String,
    #[serde(rename = "isRead")]
    pub is_read: bool,
    #[serde(rename = "readAt")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Input for sending a message
#[derive(Debug, Clone, Deserialize)]
pub struct MessageCreateInput {
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
    #[serde(rename = "receiverId")]
    pub receiver_id: String,
    pub body: String,
    #[serde(rename = "messageType")]
    pub message_type: Option<String>,
}
