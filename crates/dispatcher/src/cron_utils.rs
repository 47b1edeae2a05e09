use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tracing::warn;

use reminder_core::models::{parse_cron, ReminderSchedule};
use reminder_core::SchedulerResult;

/// CRON表达式调度工具，所有触发时间都在配置的时区中求值
pub struct CronScheduler {
    schedule: Schedule,
    time_zone: Tz,
}

impl CronScheduler {
    pub fn new(cron_expr: &str, time_zone: Tz) -> SchedulerResult<Self> {
        let schedule = parse_cron(cron_expr)?;
        Ok(Self {
            schedule,
            time_zone,
        })
    }

    /// 获取 `from` 之后（不含）的下一次触发时间
    pub fn next_execution_time(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&from.with_timezone(&self.time_zone))
            .next()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// 计算提醒在 `now` 之后的下一次触发时间
///
/// 一次性提醒的时间已过时返回 `now`，即立即触发；无后续触发时间时返回 `None`。
pub fn next_fire_time(
    schedule: &ReminderSchedule,
    time_zone: Tz,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match schedule {
        ReminderSchedule::Cron(expr) => match CronScheduler::new(expr, time_zone) {
            Ok(scheduler) => scheduler.next_execution_time(now),
            Err(e) => {
                warn!("无法解析CRON表达式 {}: {}", expr, e);
                None
            }
        },
        ReminderSchedule::Once(at) => Some((*at).max(now)),
    }
}
