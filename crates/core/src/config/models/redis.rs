use serde::{Deserialize, Serialize};

/// Redis分布式锁配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// 关闭时使用进程内锁，仅适合单实例部署
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub database: i64,
    pub password: Option<String>,
    pub connection_timeout_seconds: u64,
    pub lock_retry_count: u32,
    pub lock_retry_delay_ms: u64,
    pub lock_retry_jitter_ms: u64,
    pub lock_key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: 0,
            password: None,
            connection_timeout_seconds: 10,
            lock_retry_count: 3,
            lock_retry_delay_ms: 200,
            lock_retry_jitter_ms: 100,
            lock_key_prefix: "reminder:".to_string(),
        }
    }
}

impl RedisConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.host.is_empty() {
            return Err(anyhow::anyhow!("Redis主机地址不能为空"));
        }

        if self.port == 0 {
            return Err(anyhow::anyhow!("Redis端口必须大于0"));
        }

        if self.database < 0 {
            return Err(anyhow::anyhow!("Redis数据库索引不能为负数"));
        }

        if self.connection_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Redis连接超时时间必须大于0"));
        }

        if self.lock_key_prefix.is_empty() {
            return Err(anyhow::anyhow!("锁键前缀不能为空"));
        }

        Ok(())
    }

    pub fn build_url(&self) -> String {
        let auth = match &self.password {
            Some(password) => format!(":{password}@"),
            None => String::new(),
        };
        format!("redis://{}{}:{}/{}", auth, self.host, self.port, self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_with_password() {
        let config = RedisConfig {
            password: Some("secret".to_string()),
            database: 2,
            ..Default::default()
        };
        assert_eq!(config.build_url(), "redis://:secret@127.0.0.1:6379/2");
    }

    #[test]
    fn test_disabled_redis_skips_validation() {
        let config = RedisConfig {
            host: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = RedisConfig {
            enabled: true,
            host: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
