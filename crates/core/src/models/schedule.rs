use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use crate::errors::ValidationError;

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// 解析CRON表达式
pub fn parse_cron(expr: &str) -> Result<Schedule, ValidationError> {
    Schedule::from_str(expr).map_err(|e| ValidationError::InvalidTime {
        time: expr.to_string(),
        reason: e.to_string(),
    })
}

/// 解析RFC 3339时间戳
pub fn parse_rfc3339(time: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(time)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ValidationError::InvalidTime {
            time: time.to_string(),
            reason: e.to_string(),
        })
}

/// 解析一次性提醒的时间字符串
///
/// 带时区偏移的RFC 3339直接使用；不带偏移的日期时间按配置的时区解释。
pub fn parse_instant(time: &str, tz: Tz) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(t) = parse_rfc3339(time) {
        return Ok(t);
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(time, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(time, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| ValidationError::InvalidTime {
            time: time.to_string(),
            reason: "无法识别的日期格式".to_string(),
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| ValidationError::InvalidTime {
            time: time.to_string(),
            reason: format!("时间在时区 {tz} 中不存在"),
        })
}

/// 解析毫秒级Unix时间戳
pub fn parse_epoch_millis(millis: i64) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| ValidationError::InvalidTime {
        time: millis.to_string(),
        reason: "时间戳超出范围".to_string(),
    })
}
