use async_trait::async_trait;
use reminder_core::traits::DistributedLock;
use reminder_core::SchedulerResult;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// 进程内锁
///
/// 语义与Redis锁一致：锁在 `duration` 到期后自动失效。同一个实例被多个引擎共享时
/// 可以在测试中模拟多实例竞争同一把锁。
#[derive(Debug, Default)]
pub struct InMemoryDistributedLock {
    locks: Mutex<HashMap<String, Instant>>,
}

impl InMemoryDistributedLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前是否有人持有该锁
    pub async fn is_locked(&self, key: &str) -> bool {
        self.locks
            .lock()
            .await
            .get(key)
            .is_some_and(|expiry| *expiry > Instant::now())
    }
}

#[async_trait]
impl DistributedLock for InMemoryDistributedLock {
    async fn acquire(&self, key: &str, duration: Duration) -> SchedulerResult<bool> {
        let mut locks = self.locks.lock().await;
        let now = Instant::now();

        if locks.get(key).is_some_and(|expiry| *expiry > now) {
            debug!("锁 {} 已被持有", key);
            return Ok(false);
        }

        locks.insert(key.to_string(), now + duration);
        Ok(true)
    }

    async fn release(&self, key: &str) -> SchedulerResult<bool> {
        let mut locks = self.locks.lock().await;
        Ok(match locks.remove(key) {
            Some(expiry) => expiry > Instant::now(),
            None => false,
        })
    }
}
