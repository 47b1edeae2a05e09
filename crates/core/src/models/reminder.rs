use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ValidationError;
use crate::models::schedule::{parse_cron, parse_rfc3339};

/// 任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    HttpPost,
    Event,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::HttpPost => "HTTP_POST",
            TaskType::Event => "EVENT",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP_POST" => Ok(TaskType::HttpPost),
            "EVENT" => Ok(TaskType::Event),
            other => Err(ValidationError::InvalidTaskType {
                task_type: other.to_string(),
            }),
        }
    }
}

/// 提醒到期时执行的动作，每个变体只携带自身需要的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskDetails {
    /// 将 payload 作为请求体 POST 到 url
    HttpPost { url: String },
    /// 将 payload 发布到消息总线的 topic
    Event { topic: String },
}

impl TaskDetails {
    pub fn task_type(&self) -> TaskType {
        match self {
            TaskDetails::HttpPost { .. } => TaskType::HttpPost,
            TaskDetails::Event { .. } => TaskType::Event,
        }
    }
}

/// 提醒类型：周期提醒或一次性提醒
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderKind {
    Recurring,
    Single,
}

/// 提醒的触发计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderSchedule {
    /// 6字段CRON表达式（秒级）
    Cron(String),
    /// 一次性触发时间点
    Once(DateTime<Utc>),
}

impl ReminderSchedule {
    pub fn kind(&self) -> ReminderKind {
        match self {
            ReminderSchedule::Cron(_) => ReminderKind::Recurring,
            ReminderSchedule::Once(_) => ReminderKind::Single,
        }
    }

    pub fn is_one_shot(&self) -> bool {
        matches!(self, ReminderSchedule::Once(_))
    }

    /// 文档中 `time` 字段的字符串形式
    pub fn time_string(&self) -> String {
        match self {
            ReminderSchedule::Cron(expr) => expr.clone(),
            ReminderSchedule::Once(at) => at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl fmt::Display for ReminderSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.time_string())
    }
}

/// 已验证的提醒实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ReminderDocument", try_from = "ReminderDocument")]
pub struct Reminder {
    pub id: String,
    pub schedule: ReminderSchedule,
    /// 对引擎不透明，原样转发给执行动作
    pub payload: Value,
    pub task: TaskDetails,
}

impl Reminder {
    pub fn task_type(&self) -> TaskType {
        self.task.task_type()
    }

    pub fn kind(&self) -> ReminderKind {
        self.schedule.kind()
    }
}

/// 经过边界解码、尚未分配id的提醒
///
/// `id` 为 `None` 表示由服务端生成新的id。
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRequest {
    pub id: Option<String>,
    pub schedule: ReminderSchedule,
    pub payload: Value,
    pub task: TaskDetails,
}

impl ReminderRequest {
    pub fn into_reminder(self, id: String) -> Reminder {
        Reminder {
            id,
            schedule: self.schedule,
            payload: self.payload,
            task: self.task,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpPostTaskDetails {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTaskDetails {
    pub topic: String,
}

/// 提醒的持久化/传输文档格式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDocument {
    pub id: String,
    pub time: String,
    pub kind: ReminderKind,
    #[serde(default)]
    pub payload: Value,
    pub task_type: TaskType,
    #[serde(default)]
    pub http_post_task_details: Option<HttpPostTaskDetails>,
    #[serde(default)]
    pub event_task_details: Option<EventTaskDetails>,
}

impl From<Reminder> for ReminderDocument {
    fn from(reminder: Reminder) -> Self {
        let time = reminder.schedule.time_string();
        let kind = reminder.schedule.kind();
        let task_type = reminder.task.task_type();
        let (http_post_task_details, event_task_details) = match reminder.task {
            TaskDetails::HttpPost { url } => (Some(HttpPostTaskDetails { url }), None),
            TaskDetails::Event { topic } => (None, Some(EventTaskDetails { topic })),
        };

        Self {
            id: reminder.id,
            time,
            kind,
            payload: reminder.payload,
            task_type,
            http_post_task_details,
            event_task_details,
        }
    }
}

impl TryFrom<ReminderDocument> for Reminder {
    type Error = ValidationError;

    fn try_from(doc: ReminderDocument) -> Result<Self, Self::Error> {
        let schedule = match doc.kind {
            ReminderKind::Recurring => {
                parse_cron(&doc.time)?;
                ReminderSchedule::Cron(doc.time)
            }
            ReminderKind::Single => ReminderSchedule::Once(parse_rfc3339(&doc.time)?),
        };

        let task = match doc.task_type {
            TaskType::HttpPost => TaskDetails::HttpPost {
                url: doc
                    .http_post_task_details
                    .map(|d| d.url)
                    .ok_or(ValidationError::InvalidTaskDetailsType {
                        task_type: TaskType::HttpPost.to_string(),
                    })?,
            },
            TaskType::Event => TaskDetails::Event {
                topic: doc
                    .event_task_details
                    .map(|d| d.topic)
                    .ok_or(ValidationError::InvalidTaskDetailsType {
                        task_type: TaskType::Event.to_string(),
                    })?,
            },
        };

        Ok(Self {
            id: doc.id,
            schedule,
            payload: doc.payload,
            task,
        })
    }
}
