use async_trait::async_trait;
use reminder_core::models::Reminder;
use reminder_core::traits::ReminderRepository;
use reminder_core::{SchedulerError, SchedulerResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 内存提醒仓储
///
/// 适用于单实例嵌入式部署和测试。多个引擎实例共享同一个 `Arc<InMemoryReminderRepository>`
/// 即可模拟共享存储。
#[derive(Debug, Default)]
pub struct InMemoryReminderRepository {
    reminders: RwLock<HashMap<String, Reminder>>,
    connected: AtomicBool,
}

impl InMemoryReminderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用已有提醒初始化，模拟进程重启前已持久化的数据
    pub fn with_reminders(reminders: impl IntoIterator<Item = Reminder>) -> Self {
        let reminders = reminders
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
        Self {
            reminders: RwLock::new(reminders),
            connected: AtomicBool::new(false),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.reminders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.reminders.read().await.is_empty()
    }
}

#[async_trait]
impl ReminderRepository for InMemoryReminderRepository {
    async fn init(&self) -> SchedulerResult<()> {
        self.connected.store(true, Ordering::SeqCst);
        info!("内存提醒仓储已初始化");
        Ok(())
    }

    async fn destroy(&self) -> SchedulerResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        info!("内存提醒仓储已关闭");
        Ok(())
    }

    async fn reminder_exists(&self, id: &str) -> SchedulerResult<bool> {
        Ok(self.reminders.read().await.contains_key(id))
    }

    async fn store_reminder(&self, reminder: &Reminder) -> SchedulerResult<()> {
        let mut reminders = self.reminders.write().await;
        if reminders.contains_key(&reminder.id) {
            return Err(SchedulerError::already_exists(&reminder.id));
        }
        reminders.insert(reminder.id.clone(), reminder.clone());
        debug!("提醒已保存: {}", reminder.id);
        Ok(())
    }

    async fn get_reminder(&self, id: &str) -> SchedulerResult<Option<Reminder>> {
        Ok(self.reminders.read().await.get(id).cloned())
    }

    async fn get_reminders(&self) -> SchedulerResult<Vec<Reminder>> {
        Ok(self.reminders.read().await.values().cloned().collect())
    }

    async fn delete_reminder(&self, id: &str) -> SchedulerResult<()> {
        match self.reminders.write().await.remove(id) {
            Some(_) => {
                debug!("提醒已删除: {}", id);
                Ok(())
            }
            None => Err(SchedulerError::no_such_reminder(id)),
        }
    }
}
