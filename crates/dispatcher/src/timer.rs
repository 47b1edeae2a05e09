//! 定时器驱动
//!
//! [`TimerDriver`] 负责把一个提醒的触发计划变成可取消的定时执行。
//! 生产环境使用 [`TokioTimerDriver`]，测试可以注入手动触发的驱动。

use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::debug;

use reminder_core::models::ReminderSchedule;

use crate::cron_utils::next_fire_time;

/// 定时器回调，参数为提醒id
pub type TimerCallback = Arc<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>;

/// 可取消的定时执行句柄
pub trait TimerHandle: Send + Sync {
    /// 取消后续触发，已经开始的执行不受影响
    fn stop(&self);
}

pub trait TimerDriver: Send + Sync {
    /// 为提醒启动定时执行，每次到期时以提醒id调用 `callback`
    fn start(
        &self,
        id: &str,
        schedule: &ReminderSchedule,
        callback: TimerCallback,
    ) -> Box<dyn TimerHandle>;
}

/// 基于tokio任务的定时器驱动
///
/// 每个提醒一个后台任务：睡眠到下一次触发时间，然后把回调作为独立任务派发出去。
/// 停止定时器只会中止睡眠循环，不会中断已派发的执行。
#[derive(Debug, Clone, Copy)]
pub struct TokioTimerDriver {
    time_zone: Tz,
}

impl TokioTimerDriver {
    pub fn new(time_zone: Tz) -> Self {
        Self { time_zone }
    }
}

impl TimerDriver for TokioTimerDriver {
    fn start(
        &self,
        id: &str,
        schedule: &ReminderSchedule,
        callback: TimerCallback,
    ) -> Box<dyn TimerHandle> {
        let id = id.to_string();
        let schedule = schedule.clone();
        let time_zone = self.time_zone;

        let task = tokio::spawn(async move {
            let mut after = Utc::now();
            loop {
                let Some(next) = next_fire_time(&schedule, time_zone, after) else {
                    debug!("提醒 {} 没有后续触发时间，定时器结束", id);
                    break;
                };

                let delay = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::time::sleep(delay).await;

                tokio::spawn(callback(id.clone()));

                if schedule.is_one_shot() {
                    break;
                }
                // 唤醒延迟超过一个周期时跳过错过的触发，不做补偿
                after = next.max(Utc::now());
            }
        });

        Box::new(TokioTimerHandle { task })
    }
}

struct TokioTimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle for TokioTimerHandle {
    fn stop(&self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_callback(counter: Arc<AtomicUsize>) -> TimerCallback {
        Arc::new(move |_id| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test]
    async fn test_one_shot_fires_once() {
        let driver = TokioTimerDriver::new(chrono_tz::UTC);
        let counter = Arc::new(AtomicUsize::new(0));
        let at = Utc::now() + chrono::Duration::milliseconds(50);

        let _handle = driver.start(
            "once",
            &ReminderSchedule::Once(at),
            counting_callback(counter.clone()),
        );

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cron_fires_every_second_until_stopped() {
        let driver = TokioTimerDriver::new(chrono_tz::UTC);
        let counter = Arc::new(AtomicUsize::new(0));

        let handle = driver.start(
            "every-second",
            &ReminderSchedule::Cron("*/1 * * * * *".to_string()),
            counting_callback(counter.clone()),
        );

        tokio::time::sleep(Duration::from_millis(2500)).await;
        handle.stop();
        let fired = counter.load(Ordering::SeqCst);
        assert!(fired >= 2, "fired {fired} times");

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), fired);
    }

    #[tokio::test]
    async fn test_stopped_before_due_never_fires() {
        let driver = TokioTimerDriver::new(chrono_tz::UTC);
        let counter = Arc::new(AtomicUsize::new(0));
        let at = Utc::now() + chrono::Duration::milliseconds(200);

        let handle = driver.start(
            "cancelled",
            &ReminderSchedule::Once(at),
            counting_callback(counter.clone()),
        );
        handle.stop();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
