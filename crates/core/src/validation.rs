//! 入站提醒数据的边界解码
//!
//! 将任意JSON候选数据解码为已验证的 [`ReminderRequest`]，或返回结构化的
//! [`ValidationError`]。引擎内部只接受解码后的类型化数据。

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::{Map, Value};

use crate::errors::ValidationError;
use crate::models::{
    parse_cron, parse_epoch_millis, parse_instant, ReminderKind, ReminderRequest,
    ReminderSchedule, TaskDetails, TaskType,
};

/// 提醒解码器，一次性提醒中不带时区偏移的时间按 `time_zone` 解释
#[derive(Debug, Clone, Copy)]
pub struct ReminderDecoder {
    time_zone: Tz,
}

impl ReminderDecoder {
    pub fn new(time_zone: Tz) -> Self {
        Self { time_zone }
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// 解码周期提醒，`time` 必须是CRON表达式字符串
    pub fn decode_reminder(&self, candidate: &Value) -> Result<ReminderRequest, ValidationError> {
        self.decode(candidate, ReminderKind::Recurring)
    }

    /// 解码一次性提醒，`time` 可以是日期字符串或毫秒时间戳
    pub fn decode_single_reminder(
        &self,
        candidate: &Value,
    ) -> Result<ReminderRequest, ValidationError> {
        self.decode(candidate, ReminderKind::Single)
    }

    pub fn decode(
        &self,
        candidate: &Value,
        kind: ReminderKind,
    ) -> Result<ReminderRequest, ValidationError> {
        let obj = candidate
            .as_object()
            .ok_or(ValidationError::MissingEssentialProperties)?;

        let time = present(obj, "time").ok_or(ValidationError::MissingEssentialProperties)?;
        let task_type =
            present(obj, "taskType").ok_or(ValidationError::MissingEssentialProperties)?;
        let url = detail_field(obj, "httpPostTaskDetails", "url");
        let topic = detail_field(obj, "eventTaskDetails", "topic");
        if url.is_none() && topic.is_none() {
            return Err(ValidationError::MissingEssentialProperties);
        }

        let id = match present(obj, "id") {
            None => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(ValidationError::InvalidIdType),
        };

        let time_type_ok = match kind {
            ReminderKind::Recurring => time.is_string(),
            ReminderKind::Single => time.is_string() || time.is_number(),
        };
        if !time_type_ok {
            return Err(ValidationError::InvalidTimeType);
        }

        let task_type: TaskType = task_type
            .as_str()
            .ok_or(ValidationError::InvalidTaskTypeType)?
            .parse()?;

        let task = match task_type {
            TaskType::HttpPost => match url {
                Some(Value::String(url)) => TaskDetails::HttpPost { url: url.clone() },
                _ => return Err(invalid_details(task_type)),
            },
            TaskType::Event => match topic {
                Some(Value::String(topic)) => TaskDetails::Event {
                    topic: topic.clone(),
                },
                _ => return Err(invalid_details(task_type)),
            },
        };

        let schedule = match (kind, time) {
            (ReminderKind::Recurring, Value::String(expr)) => {
                parse_cron(expr)?;
                ReminderSchedule::Cron(expr.clone())
            }
            (ReminderKind::Single, time) => ReminderSchedule::Once(self.parse_single_time(time)?),
            _ => return Err(ValidationError::InvalidTimeType),
        };

        Ok(ReminderRequest {
            id,
            schedule,
            payload: obj.get("payload").cloned().unwrap_or(Value::Null),
            task,
        })
    }

    fn parse_single_time(&self, time: &Value) -> Result<DateTime<Utc>, ValidationError> {
        match time {
            Value::String(s) => parse_instant(s, self.time_zone),
            Value::Number(n) => {
                let millis = n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                    .ok_or_else(|| ValidationError::InvalidTime {
                        time: n.to_string(),
                        reason: "时间戳不是有效数字".to_string(),
                    })?;
                parse_epoch_millis(millis)
            }
            _ => Err(ValidationError::InvalidTimeType),
        }
    }
}

fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn detail_field<'a>(obj: &'a Map<String, Value>, branch: &str, field: &str) -> Option<&'a Value> {
    present(obj, branch)
        .and_then(|details| details.get(field))
        .filter(|v| !v.is_null())
}

fn invalid_details(task_type: TaskType) -> ValidationError {
    ValidationError::InvalidTaskDetailsType {
        task_type: task_type.to_string(),
    }
}
