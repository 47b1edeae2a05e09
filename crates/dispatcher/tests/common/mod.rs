#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::Instant;

use reminder_core::models::{Reminder, ReminderSchedule};
use reminder_core::traits::{DistributedLock, HttpActionClient, MessageProducer, ReminderRepository};
use reminder_core::{EngineConfig, SchedulerError, SchedulerResult, ServiceContainer, ServiceContext};
use reminder_dispatcher::{ReminderEngine, TimerCallback, TimerDriver, TimerHandle};
use reminder_infrastructure::{
    InMemoryDistributedLock, InMemoryMessageProducer, InMemoryReminderRepository,
};

pub const TOPIC: &str = "reminders";

/// 手动触发的定时器驱动
#[derive(Default)]
pub struct ManualTimerDriver {
    timers: Mutex<HashMap<String, ManualTimer>>,
    started: Mutex<usize>,
}

struct ManualTimer {
    schedule: ReminderSchedule,
    callback: TimerCallback,
    stopped: Arc<AtomicBool>,
}

struct ManualTimerHandle {
    stopped: Arc<AtomicBool>,
}

impl TimerHandle for ManualTimerHandle {
    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

impl TimerDriver for ManualTimerDriver {
    fn start(
        &self,
        id: &str,
        schedule: &ReminderSchedule,
        callback: TimerCallback,
    ) -> Box<dyn TimerHandle> {
        let stopped = Arc::new(AtomicBool::new(false));
        self.timers.lock().unwrap().insert(
            id.to_string(),
            ManualTimer {
                schedule: schedule.clone(),
                callback,
                stopped: stopped.clone(),
            },
        );
        *self.started.lock().unwrap() += 1;
        Box::new(ManualTimerHandle { stopped })
    }
}

impl ManualTimerDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 触发一次并等待回调完成，定时器不存在或已停止时返回 false
    pub async fn fire(&self, id: &str) -> bool {
        let callback = {
            let timers = self.timers.lock().unwrap();
            timers
                .get(id)
                .filter(|t| !t.stopped.load(Ordering::SeqCst))
                .map(|t| t.callback.clone())
        };
        match callback {
            Some(callback) => {
                callback(id.to_string()).await;
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.timers
            .lock()
            .unwrap()
            .get(id)
            .is_some_and(|t| !t.stopped.load(Ordering::SeqCst))
    }

    pub fn schedule_of(&self, id: &str) -> Option<ReminderSchedule> {
        self.timers.lock().unwrap().get(id).map(|t| t.schedule.clone())
    }

    pub fn started_count(&self) -> usize {
        *self.started.lock().unwrap()
    }
}

/// 记录请求的HTTP客户端
#[derive(Default)]
pub struct RecordingHttpClient {
    pub sent: Mutex<Vec<(String, Value)>>,
    pub fail: AtomicBool,
}

impl RecordingHttpClient {
    pub fn failing() -> Self {
        let client = Self::default();
        client.fail.store(true, Ordering::SeqCst);
        client
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpActionClient for RecordingHttpClient {
    async fn send(&self, url: &str, payload: &Value, _timeout: Duration) -> SchedulerResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(SchedulerError::HttpDispatch(format!("connection refused: {url}")));
        }
        Ok(())
    }
}

/// 记录持锁区间的锁
#[derive(Default)]
pub struct RecordingLock {
    inner: InMemoryDistributedLock,
    pub acquired_at: Mutex<HashMap<String, Instant>>,
    pub hold_intervals: Mutex<Vec<Duration>>,
}

#[async_trait]
impl DistributedLock for RecordingLock {
    async fn acquire(&self, key: &str, duration: Duration) -> SchedulerResult<bool> {
        let acquired = self.inner.acquire(key, duration).await?;
        if acquired {
            self.acquired_at
                .lock()
                .unwrap()
                .insert(key.to_string(), Instant::now());
        }
        Ok(acquired)
    }

    async fn release(&self, key: &str) -> SchedulerResult<bool> {
        if let Some(at) = self.acquired_at.lock().unwrap().remove(key) {
            self.hold_intervals.lock().unwrap().push(at.elapsed());
        }
        self.inner.release(key).await
    }
}

/// 锁被占用时按固定间隔重试，行为接近带重试策略的Redis锁
pub struct RetryingLock {
    inner: InMemoryDistributedLock,
    retry_delay: Duration,
    max_retries: usize,
}

impl RetryingLock {
    pub fn new(retry_delay: Duration, max_retries: usize) -> Self {
        Self {
            inner: InMemoryDistributedLock::new(),
            retry_delay,
            max_retries,
        }
    }
}

#[async_trait]
impl DistributedLock for RetryingLock {
    async fn acquire(&self, key: &str, duration: Duration) -> SchedulerResult<bool> {
        for _ in 0..=self.max_retries {
            if self.inner.acquire(key, duration).await? {
                return Ok(true);
            }
            tokio::time::sleep(self.retry_delay).await;
        }
        Ok(false)
    }

    async fn release(&self, key: &str) -> SchedulerResult<bool> {
        self.inner.release(key).await
    }
}

/// 删除操作较慢的仓储
pub struct SlowDeleteRepository {
    pub inner: InMemoryReminderRepository,
    delete_delay: Duration,
}

impl SlowDeleteRepository {
    pub fn new(delete_delay: Duration) -> Self {
        Self {
            inner: InMemoryReminderRepository::new(),
            delete_delay,
        }
    }
}

#[async_trait]
impl ReminderRepository for SlowDeleteRepository {
    async fn init(&self) -> SchedulerResult<()> {
        self.inner.init().await
    }

    async fn destroy(&self) -> SchedulerResult<()> {
        self.inner.destroy().await
    }

    async fn reminder_exists(&self, id: &str) -> SchedulerResult<bool> {
        self.inner.reminder_exists(id).await
    }

    async fn store_reminder(&self, reminder: &Reminder) -> SchedulerResult<()> {
        self.inner.store_reminder(reminder).await
    }

    async fn get_reminder(&self, id: &str) -> SchedulerResult<Option<Reminder>> {
        self.inner.get_reminder(id).await
    }

    async fn get_reminders(&self) -> SchedulerResult<Vec<Reminder>> {
        self.inner.get_reminders().await
    }

    async fn delete_reminder(&self, id: &str) -> SchedulerResult<()> {
        tokio::time::sleep(self.delete_delay).await;
        self.inner.delete_reminder(id).await
    }
}

pub fn engine_config(min_task_duration: Duration) -> EngineConfig {
    EngineConfig {
        time_zone: chrono_tz::UTC,
        lock_timeout: Duration::from_secs(5),
        min_task_duration,
        http_timeout: Duration::from_millis(500),
        event_topics: [TOPIC.to_string()].into_iter().collect(),
    }
}

pub fn context(
    repository: Arc<dyn ReminderRepository>,
    lock: Arc<dyn DistributedLock>,
    http_client: Arc<dyn HttpActionClient>,
    producer: Arc<dyn MessageProducer>,
) -> ServiceContext {
    let mut container = ServiceContainer::new();
    container
        .register_repository(repository)
        .register_lock(lock)
        .register_http_client(http_client)
        .register_producer(producer);
    container.build().unwrap()
}

/// 全部使用内存实现的测试环境
pub struct Harness {
    pub engine: ReminderEngine,
    pub driver: Arc<ManualTimerDriver>,
    pub repository: Arc<InMemoryReminderRepository>,
    pub lock: Arc<InMemoryDistributedLock>,
    pub http: Arc<RecordingHttpClient>,
    pub producer: Arc<InMemoryMessageProducer>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_repository(Arc::new(InMemoryReminderRepository::new())).await
    }

    pub async fn with_repository(repository: Arc<InMemoryReminderRepository>) -> Self {
        let driver = Arc::new(ManualTimerDriver::new());
        let lock = Arc::new(InMemoryDistributedLock::new());
        let http = Arc::new(RecordingHttpClient::default());
        let producer = Arc::new(InMemoryMessageProducer::new());

        let engine = ReminderEngine::new(
            context(
                repository.clone(),
                lock.clone(),
                http.clone(),
                producer.clone(),
            ),
            engine_config(Duration::ZERO),
            driver.clone(),
        );
        engine.init().await.unwrap();

        Self {
            engine,
            driver,
            repository,
            lock,
            http,
            producer,
        }
    }
}

pub fn http_candidate(id: Option<&str>) -> Value {
    let mut candidate = json!({
        "time": "0 0 9 * * *",
        "payload": {"message": "stand-up"},
        "taskType": "HTTP_POST",
        "httpPostTaskDetails": {"url": "http://callback.local/hook"},
        "eventTaskDetails": null
    });
    if let Some(id) = id {
        candidate["id"] = json!(id);
    }
    candidate
}

pub fn event_candidate(id: Option<&str>, topic: &str) -> Value {
    let mut candidate = json!({
        "time": "0 */5 * * * *",
        "payload": {"user": 42},
        "taskType": "EVENT",
        "httpPostTaskDetails": null,
        "eventTaskDetails": {"topic": topic}
    });
    if let Some(id) = id {
        candidate["id"] = json!(id);
    }
    candidate
}

pub fn single_event_candidate(id: &str, time: Value) -> Value {
    json!({
        "id": id,
        "time": time,
        "payload": {"once": true},
        "taskType": "EVENT",
        "eventTaskDetails": {"topic": TOPIC}
    })
}
