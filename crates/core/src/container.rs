use std::sync::Arc;

use crate::traits::{DistributedLock, HttpActionClient, MessageProducer, ReminderRepository};
use crate::{SchedulerError, SchedulerResult};

/// 进程启动时收集各适配器的服务容器
pub struct ServiceContainer {
    repository: Option<Arc<dyn ReminderRepository>>,
    lock: Option<Arc<dyn DistributedLock>>,
    http_client: Option<Arc<dyn HttpActionClient>>,
    producer: Option<Arc<dyn MessageProducer>>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self {
            repository: None,
            lock: None,
            http_client: None,
            producer: None,
        }
    }

    pub fn register_repository(&mut self, service: Arc<dyn ReminderRepository>) -> &mut Self {
        self.repository = Some(service);
        self
    }

    pub fn register_lock(&mut self, service: Arc<dyn DistributedLock>) -> &mut Self {
        self.lock = Some(service);
        self
    }

    pub fn register_http_client(&mut self, service: Arc<dyn HttpActionClient>) -> &mut Self {
        self.http_client = Some(service);
        self
    }

    pub fn register_producer(&mut self, service: Arc<dyn MessageProducer>) -> &mut Self {
        self.producer = Some(service);
        self
    }

    /// 生成不可变的服务上下文，任一服务未注册时失败
    pub fn build(self) -> SchedulerResult<ServiceContext> {
        Ok(ServiceContext {
            repository: self
                .repository
                .ok_or_else(|| not_registered("Reminder repository"))?,
            lock: self.lock.ok_or_else(|| not_registered("Distributed lock"))?,
            http_client: self
                .http_client
                .ok_or_else(|| not_registered("HTTP action client"))?,
            producer: self
                .producer
                .ok_or_else(|| not_registered("Message producer"))?,
        })
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

fn not_registered(service: &str) -> SchedulerError {
    SchedulerError::Internal(format!("{service} not registered"))
}

/// 引擎持有的依赖集合
#[derive(Clone)]
pub struct ServiceContext {
    pub repository: Arc<dyn ReminderRepository>,
    pub lock: Arc<dyn DistributedLock>,
    pub http_client: Arc<dyn HttpActionClient>,
    pub producer: Arc<dyn MessageProducer>,
}
