use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 事件类提醒到期时发布到消息总线的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderMessage {
    pub id: String,
    pub reminder_id: String,
    pub topic: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl ReminderMessage {
    pub fn new(reminder_id: &str, topic: &str, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            reminder_id: reminder_id.to_string(),
            topic: topic.to_string(),
            payload,
            timestamp: Utc::now(),
        }
    }
}
