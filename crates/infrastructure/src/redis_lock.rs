use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};
use reminder_core::config::RedisConfig;
use reminder_core::traits::DistributedLock;
use reminder_core::{SchedulerError, SchedulerResult};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Deletes the key only if it still holds our token, so an expired lock that
/// another instance has since taken is never released by us.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Retry policy for lock acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRetryPolicy {
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub retry_jitter: Duration,
}

impl LockRetryPolicy {
    pub fn from_config(config: &RedisConfig) -> Self {
        Self {
            retry_count: config.lock_retry_count,
            retry_delay: Duration::from_millis(config.lock_retry_delay_ms),
            retry_jitter: Duration::from_millis(config.lock_retry_jitter_ms),
        }
    }

    /// Delay before the next attempt: base delay plus up to `retry_jitter` of noise
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.retry_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::random::<u64>() % (jitter_ms + 1)
        };
        self.retry_delay + Duration::from_millis(jitter)
    }
}

/// Redis backed distributed lock
///
/// Acquisition is `SET key token NX PX duration`, retried per [`LockRetryPolicy`].
/// Each instance owns a unique token; release runs a compare-and-delete script.
pub struct RedisDistributedLock {
    connection: ConnectionManager,
    key_prefix: String,
    policy: LockRetryPolicy,
    owner: String,
    held: Mutex<HashMap<String, String>>,
}

impl RedisDistributedLock {
    pub async fn connect(config: &RedisConfig) -> SchedulerResult<Self> {
        let client = Client::open(config.build_url()).map_err(|e| {
            SchedulerError::Lock(format!("Failed to create Redis client: {e}"))
        })?;

        let connect_timeout = Duration::from_secs(config.connection_timeout_seconds);
        let connection = timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                SchedulerError::Lock(format!(
                    "Timed out connecting to Redis at {}:{}",
                    config.host, config.port
                ))
            })?
            .map_err(|e| SchedulerError::Lock(format!("Failed to connect to Redis: {e}")))?;

        info!(
            "Connected lock backend to Redis at {}:{}",
            config.host, config.port
        );

        Ok(Self {
            connection,
            key_prefix: config.lock_key_prefix.clone(),
            policy: LockRetryPolicy::from_config(config),
            owner: lock_owner(),
            held: Mutex::new(HashMap::new()),
        })
    }

    pub fn policy(&self) -> LockRetryPolicy {
        self.policy
    }

    fn key(&self, key: &str) -> String {
        lock_key(&self.key_prefix, key)
    }

    async fn try_set(&self, key: &str, token: &str, duration: Duration) -> SchedulerResult<bool> {
        let mut conn = self.connection.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(duration.as_millis().max(1) as u64)
            .query_async(&mut conn)
            .await
            .map_err(|e| SchedulerError::Lock(format!("Redis SET failed for {key}: {e}")))?;
        Ok(reply.is_some())
    }
}

#[async_trait]
impl DistributedLock for RedisDistributedLock {
    async fn acquire(&self, key: &str, duration: Duration) -> SchedulerResult<bool> {
        let redis_key = self.key(key);
        let token = format!("{}:{}", self.owner, Uuid::new_v4());
        let mut last_error = None;

        for attempt in 0..=self.policy.retry_count {
            match self.try_set(&redis_key, &token, duration).await {
                Ok(true) => {
                    self.held.lock().await.insert(redis_key, token);
                    if attempt > 0 {
                        debug!("Acquired lock {} after {} attempts", key, attempt + 1);
                    }
                    return Ok(true);
                }
                Ok(false) => last_error = None,
                Err(e) => {
                    warn!(
                        "Lock attempt {}/{} for {} failed: {}",
                        attempt + 1,
                        self.policy.retry_count + 1,
                        key,
                        e
                    );
                    last_error = Some(e);
                }
            }

            if attempt < self.policy.retry_count {
                sleep(self.policy.next_delay()).await;
            }
        }

        match last_error {
            Some(e) => {
                error!("Giving up on lock {}: {}", key, e);
                Err(e)
            }
            None => Ok(false),
        }
    }

    async fn release(&self, key: &str) -> SchedulerResult<bool> {
        let redis_key = self.key(key);
        let Some(token) = self.held.lock().await.remove(&redis_key) else {
            debug!("Release of lock {} not held by this instance", key);
            return Ok(false);
        };

        let mut conn = self.connection.clone();
        let deleted: i64 = Script::new(RELEASE_SCRIPT)
            .key(&redis_key)
            .arg(&token)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| SchedulerError::Lock(format!("Failed to release lock {key}: {e}")))?;

        if deleted == 0 {
            warn!("Lock {} expired before release", key);
        }
        Ok(deleted == 1)
    }
}

/// Namespaced Redis key for a reminder lock
pub fn lock_key(prefix: &str, key: &str) -> String {
    format!("{prefix}{key}")
}

fn lock_owner() -> String {
    hostname::get()
        .unwrap_or_else(|_| "unknown".into())
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_key_uses_prefix() {
        assert_eq!(lock_key("reminder:", "abc"), "reminder:abc");
    }

    #[test]
    fn test_next_delay_stays_within_jitter() {
        let policy = LockRetryPolicy {
            retry_count: 3,
            retry_delay: Duration::from_millis(200),
            retry_jitter: Duration::from_millis(50),
        };
        for _ in 0..100 {
            let delay = policy.next_delay();
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(250));
        }

        let no_jitter = LockRetryPolicy {
            retry_jitter: Duration::ZERO,
            ..policy
        };
        assert_eq!(no_jitter.next_delay(), Duration::from_millis(200));
    }

    #[test]
    fn test_policy_from_config() {
        let config = RedisConfig {
            lock_retry_count: 5,
            lock_retry_delay_ms: 10,
            lock_retry_jitter_ms: 3,
            ..Default::default()
        };
        let policy = LockRetryPolicy::from_config(&config);
        assert_eq!(policy.retry_count, 5);
        assert_eq!(policy.retry_delay, Duration::from_millis(10));
        assert_eq!(policy.retry_jitter, Duration::from_millis(3));
    }
}
