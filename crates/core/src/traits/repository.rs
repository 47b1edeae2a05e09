//! 提醒仓储接口定义
//!
//! 仓储是提醒集合的唯一事实来源，负责id唯一性判定。引擎启动时从仓储
//! 重建全部定时器，因此进程重启不会丢失提醒。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use reminder_core::traits::ReminderRepository;
//!
//! async fn reload(repo: &dyn ReminderRepository) -> SchedulerResult<()> {
//!     repo.init().await?;
//!     for reminder in repo.get_reminders().await? {
//!         println!("{} -> {}", reminder.id, reminder.schedule);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;

use crate::models::Reminder;
use crate::SchedulerResult;

/// 提醒仓储接口
///
/// # 错误约定
///
/// - `store_reminder` 遇到重复id时返回 [`SchedulerError::ReminderAlreadyExists`]
/// - `delete_reminder` 遇到不存在的id时返回 [`SchedulerError::NoSuchReminder`]
/// - 其他存储故障统一返回 [`SchedulerError::Storage`]
///
/// [`SchedulerError::ReminderAlreadyExists`]: crate::SchedulerError::ReminderAlreadyExists
/// [`SchedulerError::NoSuchReminder`]: crate::SchedulerError::NoSuchReminder
/// [`SchedulerError::Storage`]: crate::SchedulerError::Storage
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// 建立到存储后端的连接
    async fn init(&self) -> SchedulerResult<()>;

    /// 断开连接并释放资源
    async fn destroy(&self) -> SchedulerResult<()>;

    /// 检查id是否已被占用
    async fn reminder_exists(&self, id: &str) -> SchedulerResult<bool>;

    /// 持久化新提醒，id重复时失败
    async fn store_reminder(&self, reminder: &Reminder) -> SchedulerResult<()>;

    /// 根据id获取提醒
    async fn get_reminder(&self, id: &str) -> SchedulerResult<Option<Reminder>>;

    /// 获取全部提醒
    async fn get_reminders(&self) -> SchedulerResult<Vec<Reminder>>;

    /// 删除提醒，id不存在时失败
    async fn delete_reminder(&self, id: &str) -> SchedulerResult<()>;
}
