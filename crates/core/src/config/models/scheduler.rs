use std::collections::HashSet;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{SchedulerError, SchedulerResult};

/// 提醒存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryKind {
    #[default]
    Memory,
}

/// 调度引擎配置段
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// IANA时区标识，CRON表达式和不带偏移的日期按此时区解释
    pub time_zone: String,
    pub lock_timeout_ms: u64,
    pub min_task_duration_ms: u64,
    pub http_timeout_ms: u64,
    pub repository: RepositoryKind,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            time_zone: "UTC".to_string(),
            lock_timeout_ms: 5000,
            min_task_duration_ms: 1000,
            http_timeout_ms: 3000,
            repository: RepositoryKind::Memory,
        }
    }
}

impl SchedulerSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("无效的时区 {}: {}", self.time_zone, e))?;

        if self.lock_timeout_ms == 0 {
            return Err(anyhow::anyhow!("锁超时时间必须大于0"));
        }

        if self.http_timeout_ms == 0 {
            return Err(anyhow::anyhow!("HTTP超时时间必须大于0"));
        }

        // 锁必须在最短执行时长和HTTP回调结束前保持有效
        if self.min_task_duration_ms >= self.lock_timeout_ms {
            return Err(anyhow::anyhow!(
                "最短任务时长({}ms)必须小于锁超时时间({}ms)",
                self.min_task_duration_ms,
                self.lock_timeout_ms
            ));
        }

        if self.http_timeout_ms >= self.lock_timeout_ms {
            return Err(anyhow::anyhow!(
                "HTTP超时时间({}ms)必须小于锁超时时间({}ms)",
                self.http_timeout_ms,
                self.lock_timeout_ms
            ));
        }

        Ok(())
    }
}

/// 调度引擎运行参数
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub time_zone: Tz,
    /// 分布式锁持有期限
    pub lock_timeout: Duration,
    /// 单次执行的最短时长，不足时在释放锁前补足
    pub min_task_duration: Duration,
    pub http_timeout: Duration,
    /// 可识别的事件主题，未列出的主题在触发时报错
    pub event_topics: HashSet<String>,
}

impl EngineConfig {
    pub fn with_event_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_known_topic(&self, topic: &str) -> bool {
        self.event_topics.contains(topic)
    }
}

impl TryFrom<&SchedulerSettings> for EngineConfig {
    type Error = SchedulerError;

    fn try_from(settings: &SchedulerSettings) -> SchedulerResult<Self> {
        let time_zone = settings.time_zone.parse::<Tz>().map_err(|e| {
            SchedulerError::config_error(format!("无效的时区 {}: {e}", settings.time_zone))
        })?;

        Ok(Self {
            time_zone,
            lock_timeout: Duration::from_millis(settings.lock_timeout_ms),
            min_task_duration: Duration::from_millis(settings.min_task_duration_ms),
            http_timeout: Duration::from_millis(settings.http_timeout_ms),
            event_topics: HashSet::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_from_settings() {
        let settings = SchedulerSettings {
            time_zone: "Europe/Berlin".to_string(),
            ..Default::default()
        };
        let config = EngineConfig::try_from(&settings)
            .unwrap()
            .with_event_topics(["reminders"]);

        assert_eq!(config.time_zone, chrono_tz::Europe::Berlin);
        assert_eq!(config.lock_timeout, Duration::from_millis(5000));
        assert!(config.is_known_topic("reminders"));
        assert!(!config.is_known_topic("billing"));
    }

    #[test]
    fn test_invalid_time_zone() {
        let settings = SchedulerSettings {
            time_zone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        assert!(matches!(
            EngineConfig::try_from(&settings),
            Err(SchedulerError::Configuration(_))
        ));
    }

    #[test]
    fn test_min_duration_must_fit_inside_lock() {
        let settings = SchedulerSettings {
            lock_timeout_ms: 1000,
            min_task_duration_ms: 1000,
            http_timeout_ms: 500,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
