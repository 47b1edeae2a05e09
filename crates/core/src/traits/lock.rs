use std::time::Duration;

use async_trait::async_trait;

use crate::SchedulerResult;

/// 跨实例互斥的分布式锁
///
/// 按提醒id加锁，保证同一次到期触发最多只有一个实例执行动作。
/// 获取语义是尽力而为的，不提供线性一致性。
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// 尝试获取锁，`duration` 为锁的持有期限
    ///
    /// 返回 `Ok(false)` 表示锁被其他实例持有。
    async fn acquire(&self, key: &str, duration: Duration) -> SchedulerResult<bool>;

    /// 释放本实例持有的锁，返回是否确实释放
    async fn release(&self, key: &str) -> SchedulerResult<bool>;
}
