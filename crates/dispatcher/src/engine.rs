//! 提醒调度引擎
//!
//! 引擎是提醒生命周期的唯一入口：启动时从仓储重建定时器，负责创建和删除，
//! 并在定时器到期时执行加锁的单次触发协议：
//!
//! 1. 以提醒id获取分布式锁，失败则跳过本次触发（持锁实例负责执行）
//! 2. 从仓储重新读取提醒，已不存在则直接返回
//! 3. 按任务类型分发：HTTP回调或事件发布
//! 4. 一次性提醒在持锁期间从仓储删除，其他实例随后读取时得到不存在
//! 5. 执行时长不足最短任务时长时睡眠补足
//! 6. 无论分发结果如何都释放锁
//! 7. 一次性提醒在释放锁后移除本地定时器

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use chrono::Utc;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use reminder_core::models::{Reminder, ReminderMessage, ReminderRequest, TaskDetails, TaskType};
use reminder_core::{
    EngineConfig, ReminderDecoder, SchedulerError, SchedulerResult, ServiceContext,
    ValidationError,
};
use reminder_infrastructure::observability::{MetricsCollector, StructuredLogger};

use crate::cron_utils::next_fire_time;
use crate::timer::{TimerCallback, TimerDriver, TokioTimerDriver};
use crate::timer_registry::TimerRegistry;

/// 单次触发的执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// 未获取到锁，本实例跳过
    Skipped,
    /// 持锁后发现提醒已被删除
    Missing,
    Dispatched,
    /// 分发失败，已记录日志
    DispatchFailed,
}

/// 提醒调度引擎
///
/// 克隆开销很小，所有克隆共享同一份状态。
#[derive(Clone)]
pub struct ReminderEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    context: ServiceContext,
    config: EngineConfig,
    decoder: ReminderDecoder,
    timers: Mutex<TimerRegistry>,
    metrics: MetricsCollector,
}

impl ReminderEngine {
    pub fn new(context: ServiceContext, config: EngineConfig, driver: Arc<dyn TimerDriver>) -> Self {
        let decoder = ReminderDecoder::new(config.time_zone);
        Self {
            inner: Arc::new(EngineInner {
                context,
                config,
                decoder,
                timers: Mutex::new(TimerRegistry::new(driver)),
                metrics: MetricsCollector::new(),
            }),
        }
    }

    /// 使用tokio定时器驱动创建引擎
    pub fn with_tokio_driver(context: ServiceContext, config: EngineConfig) -> Self {
        let driver = Arc::new(TokioTimerDriver::new(config.time_zone));
        Self::new(context, config, driver)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn decoder(&self) -> &ReminderDecoder {
        &self.inner.decoder
    }

    /// 连接消息生产者和仓储，并为所有已持久化的提醒安装定时器
    ///
    /// 任一步骤失败都返回 [`SchedulerError::UnableToInit`]，调用方应中止启动。
    pub async fn init(&self) -> SchedulerResult<()> {
        let context = &self.inner.context;

        context.producer.connect().await.map_err(|e| {
            error!("消息生产者连接失败: {}", e);
            SchedulerError::UnableToInit(format!("消息生产者连接失败: {e}"))
        })?;

        context.repository.init().await.map_err(|e| {
            error!("提醒仓储初始化失败: {}", e);
            SchedulerError::UnableToInit(format!("提醒仓储初始化失败: {e}"))
        })?;

        let reminders = context.repository.get_reminders().await.map_err(|e| {
            error!("加载提醒失败: {}", e);
            SchedulerError::UnableToInit(format!("加载提醒失败: {e}"))
        })?;

        let mut timers = self.inner.timers.lock().await;
        for reminder in &reminders {
            self.arm(&mut timers, reminder);
        }
        self.inner.metrics.update_active_timers(timers.len());
        StructuredLogger::log_timers_restored(reminders.len());

        Ok(())
    }

    /// 创建周期提醒
    pub async fn create_reminder(&self, request: ReminderRequest) -> SchedulerResult<String> {
        self.create(request).await
    }

    /// 创建一次性提醒
    pub async fn create_single_reminder(&self, request: ReminderRequest) -> SchedulerResult<String> {
        self.create(request).await
    }

    /// 解码并创建周期提醒
    pub async fn create_reminder_from_value(&self, candidate: &Value) -> SchedulerResult<String> {
        let request = self.inner.decoder.decode_reminder(candidate)?;
        self.create(request).await
    }

    /// 解码并创建一次性提醒
    pub async fn create_single_reminder_from_value(
        &self,
        candidate: &Value,
    ) -> SchedulerResult<String> {
        let request = self.inner.decoder.decode_single_reminder(candidate)?;
        self.create(request).await
    }

    async fn create(&self, request: ReminderRequest) -> SchedulerResult<String> {
        let id = match request.id.clone() {
            Some(id) => id,
            None => self.generate_id().await?,
        };
        let reminder = request.into_reminder(id);

        let mut timers = self.inner.timers.lock().await;
        match self.inner.context.repository.store_reminder(&reminder).await {
            Ok(()) => {}
            Err(e @ SchedulerError::ReminderAlreadyExists { .. }) => return Err(e),
            Err(e) => {
                error!("保存提醒 {} 失败: {}", reminder.id, e);
                return Err(wrap_storage(e));
            }
        }

        self.arm(&mut timers, &reminder);
        self.inner.metrics.update_active_timers(timers.len());
        drop(timers);

        self.inner
            .metrics
            .record_reminder_created(reminder.task_type().as_str());
        StructuredLogger::log_reminder_created(
            &reminder.id,
            reminder.task_type().as_str(),
            &reminder.schedule.time_string(),
        );

        Ok(reminder.id)
    }

    async fn generate_id(&self) -> SchedulerResult<String> {
        loop {
            let id = Uuid::new_v4().to_string();
            let exists = self
                .inner
                .context
                .repository
                .reminder_exists(&id)
                .await
                .map_err(|e| {
                    error!("检查提醒id失败: {}", e);
                    wrap_storage(e)
                })?;
            if !exists {
                return Ok(id);
            }
            debug!("生成的提醒id {} 已存在，重新生成", id);
        }
    }

    pub async fn get_reminder(&self, id: &str) -> SchedulerResult<Option<Reminder>> {
        self.inner
            .context
            .repository
            .get_reminder(id)
            .await
            .map_err(|e| {
                error!("读取提醒 {} 失败: {}", id, e);
                wrap_storage(e)
            })
    }

    pub async fn get_reminders(&self) -> SchedulerResult<Vec<Reminder>> {
        self.inner
            .context
            .repository
            .get_reminders()
            .await
            .map_err(|e| {
                error!("读取提醒列表失败: {}", e);
                wrap_storage(e)
            })
    }

    /// 删除提醒及其定时器
    ///
    /// 提醒不存在时返回 [`SchedulerError::NoSuchReminder`]。
    pub async fn delete_reminder(&self, id: &str) -> SchedulerResult<()> {
        let mut timers = self.inner.timers.lock().await;
        self.inner
            .context
            .repository
            .delete_reminder(id)
            .await
            .map_err(|e| match e {
                SchedulerError::NoSuchReminder { .. } => e,
                other => {
                    error!("删除提醒 {} 失败: {}", id, other);
                    wrap_storage(other)
                }
            })?;

        timers.stop(id);
        timers.remove(id);
        self.inner.metrics.update_active_timers(timers.len());
        drop(timers);

        self.inner.metrics.record_reminder_deleted();
        StructuredLogger::log_reminder_deleted(id);
        Ok(())
    }

    /// 删除本实例定时器注册表中的全部提醒
    ///
    /// 遇到第一个仓储错误即中止并返回。与逐个删除不同，仓储中已不存在的提醒
    /// （可能已被其他实例删除）不算失败，视为已删除并继续，不向调用方传播
    /// [`SchedulerError::NoSuchReminder`]。
    pub async fn delete_reminders(&self) -> SchedulerResult<()> {
        let mut timers = self.inner.timers.lock().await;
        let ids = timers.ids();

        for id in ids {
            match self.inner.context.repository.delete_reminder(&id).await {
                Ok(()) | Err(SchedulerError::NoSuchReminder { .. }) => {}
                Err(e) => {
                    error!("批量删除提醒在 {} 处失败: {}", id, e);
                    self.inner.metrics.update_active_timers(timers.len());
                    return Err(wrap_storage(e));
                }
            }
            timers.stop(&id);
            timers.remove(&id);
            self.inner.metrics.record_reminder_deleted();
            StructuredLogger::log_reminder_deleted(&id);
        }

        self.inner.metrics.update_active_timers(timers.len());
        Ok(())
    }

    /// 停止全部定时器并断开外部连接，不删除已持久化的提醒
    pub async fn destroy(&self) -> SchedulerResult<()> {
        {
            let mut timers = self.inner.timers.lock().await;
            timers.stop_all();
            for id in timers.ids() {
                timers.remove(&id);
            }
            self.inner.metrics.update_active_timers(0);
        }
        info!("所有提醒定时器已停止");

        let producer_result = self.inner.context.producer.destroy().await;
        if let Err(e) = &producer_result {
            error!("关闭消息生产者失败: {}", e);
        }
        let repository_result = self.inner.context.repository.destroy().await;
        if let Err(e) = &repository_result {
            error!("关闭提醒仓储失败: {}", e);
        }

        producer_result.and(repository_result)
    }

    pub async fn active_timer_count(&self) -> usize {
        self.inner.timers.lock().await.len()
    }

    pub async fn has_timer(&self, id: &str) -> bool {
        self.inner.timers.lock().await.contains(id)
    }

    pub async fn timer_ids(&self) -> Vec<String> {
        self.inner.timers.lock().await.ids()
    }

    /// 定时器到期时执行的加锁单次触发协议
    ///
    /// 基础设施故障只记录日志，返回 `Ok`；只有提醒自身配置错误（未识别的事件主题、
    /// 空的回调URL）返回 `Err`。
    pub async fn run_reminder_task(&self, id: &str) -> SchedulerResult<TaskOutcome> {
        let inner = &self.inner;
        inner.metrics.record_fire();
        StructuredLogger::log_reminder_fired(id);

        let started = Instant::now();
        match inner
            .context
            .lock
            .acquire(id, inner.config.lock_timeout)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                inner.metrics.record_lock_skip();
                StructuredLogger::log_lock_skipped(id, None);
                return Ok(TaskOutcome::Skipped);
            }
            Err(e) => {
                inner.metrics.record_lock_skip();
                StructuredLogger::log_lock_skipped(id, Some(&e.to_string()));
                return Ok(TaskOutcome::Skipped);
            }
        }

        let (result, fetched) = AssertUnwindSafe(self.execute_locked(id))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!("提醒 {} 执行时发生panic", id);
                (
                    Err(SchedulerError::Internal(format!("提醒 {id} 执行时发生panic"))),
                    None,
                )
            });

        let one_shot = fetched.as_ref().is_some_and(|r| r.schedule.is_one_shot());

        let elapsed = started.elapsed();
        if elapsed < inner.config.min_task_duration {
            sleep(inner.config.min_task_duration - elapsed).await;
        }

        let held = started.elapsed();
        match inner.context.lock.release(id).await {
            Ok(released) => {
                StructuredLogger::log_lock_released(id, held.as_millis() as u64, released)
            }
            Err(e) => warn!("释放提醒 {} 的锁失败: {}", id, e),
        }
        inner.metrics.record_lock_hold(held.as_secs_f64());

        if one_shot {
            self.drop_exhausted_timer(id).await;
        }

        result
    }

    /// 持锁期间的读取、分发和一次性提醒删除，返回分发结果和读取到的提醒
    async fn execute_locked(&self, id: &str) -> (SchedulerResult<TaskOutcome>, Option<Reminder>) {
        let reminder = match self.inner.context.repository.get_reminder(id).await {
            Ok(Some(reminder)) => reminder,
            Ok(None) => {
                StructuredLogger::log_reminder_missing(id);
                return (Ok(TaskOutcome::Missing), None);
            }
            Err(e) => {
                error!("执行前读取提醒 {} 失败: {}", id, e);
                return (Ok(TaskOutcome::DispatchFailed), None);
            }
        };

        let task_type = reminder.task_type();
        let started = Instant::now();
        let dispatched = self.dispatch(&reminder).await;
        let duration = started.elapsed();
        let error_message = dispatched.as_ref().err().map(ToString::to_string);

        StructuredLogger::log_dispatch_complete(
            id,
            task_type.as_str(),
            dispatched.is_ok(),
            duration.as_millis() as u64,
            error_message.as_deref(),
        );
        self.inner.metrics.record_dispatch(
            task_type.as_str(),
            dispatched.is_ok(),
            duration.as_secs_f64(),
        );

        let result = match dispatched {
            Ok(()) => Ok(TaskOutcome::Dispatched),
            Err(e @ SchedulerError::UnknownTopic { .. }) | Err(e @ SchedulerError::Validation(_)) => {
                Err(e)
            }
            Err(_) => Ok(TaskOutcome::DispatchFailed),
        };
        if reminder.schedule.is_one_shot() {
            self.delete_fired_one_shot(id).await;
        }
        (result, Some(reminder))
    }

    async fn dispatch(&self, reminder: &Reminder) -> SchedulerResult<()> {
        let context = &self.inner.context;
        match &reminder.task {
            TaskDetails::HttpPost { url } => {
                if url.is_empty() {
                    return Err(ValidationError::InvalidTaskDetailsType {
                        task_type: TaskType::HttpPost.to_string(),
                    }
                    .into());
                }
                context
                    .http_client
                    .send(url, &reminder.payload, self.inner.config.http_timeout)
                    .await
            }
            TaskDetails::Event { topic } => {
                if !self.inner.config.is_known_topic(topic) {
                    error!("提醒 {} 的事件主题 {} 未被识别", reminder.id, topic);
                    return Err(SchedulerError::UnknownTopic {
                        topic: topic.clone(),
                    });
                }
                let message = ReminderMessage::new(&reminder.id, topic, reminder.payload.clone());
                context.producer.send(&message).await
            }
        }
    }

    /// 持锁期间删除已触发的一次性提醒，不存在视为已删除
    async fn delete_fired_one_shot(&self, id: &str) {
        match self.inner.context.repository.delete_reminder(id).await {
            Ok(()) | Err(SchedulerError::NoSuchReminder { .. }) => {
                StructuredLogger::log_one_shot_retired(id);
            }
            Err(e) => error!("删除已触发的一次性提醒 {} 失败: {}", id, e),
        }
    }

    /// 停止并移除已耗尽的一次性定时器
    async fn drop_exhausted_timer(&self, id: &str) {
        let mut timers = self.inner.timers.lock().await;
        timers.stop(id);
        if timers.remove(id) {
            debug!("一次性提醒 {} 的定时器已移除", id);
            self.inner.metrics.update_active_timers(timers.len());
        }
    }

    fn arm(&self, timers: &mut TimerRegistry, reminder: &Reminder) {
        timers.stop(&reminder.id);
        timers.set(&reminder.id, &reminder.schedule, self.callback(reminder));
        StructuredLogger::log_timer_scheduled(
            &reminder.id,
            next_fire_time(&reminder.schedule, self.inner.config.time_zone, Utc::now()),
        );
    }

    fn callback(&self, reminder: &Reminder) -> TimerCallback {
        let engine: Weak<EngineInner> = Arc::downgrade(&self.inner);
        let one_shot = reminder.schedule.is_one_shot();

        Arc::new(move |id: String| {
            let engine = engine.clone();
            async move {
                let Some(inner) = engine.upgrade() else {
                    return;
                };
                let engine = ReminderEngine { inner };

                if let Err(e) = engine.run_reminder_task(&id).await {
                    error!(
                        error_code = e.error_code(),
                        "提醒 {} 执行失败: {}", id, e
                    );
                }
                if one_shot {
                    engine.drop_exhausted_timer(&id).await;
                }
            }
            .boxed()
        })
    }
}

fn wrap_storage(e: SchedulerError) -> SchedulerError {
    match e {
        SchedulerError::Storage(_) => e,
        other => SchedulerError::storage_error(other.to_string()),
    }
}
