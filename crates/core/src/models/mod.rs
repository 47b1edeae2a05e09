//! # 数据模型
//!
//! 定义提醒调度服务的核心数据结构。
//!
//! ## 核心模型
//!
//! ### Reminder - 提醒
//! 已验证的提醒实体。触发计划 [`ReminderSchedule`] 区分周期(CRON)与一次性提醒，
//! 执行动作 [`TaskDetails`] 区分HTTP回调与事件发布，每个变体只携带自身需要的参数。
//!
//! ### ReminderDocument - 文档格式
//! 持久化和网络传输使用的JSON文档格式，反序列化时重新验证。
//!
//! ### ReminderMessage - 事件消息
//! 事件类提醒到期时发布到消息总线的消息。
//!
//! ## 设计原则
//!
//! - 所有时间字段使用 `DateTime<Utc>`，CRON表达式按配置的时区求值
//! - 无效状态不可表示：不存在同时缺少URL和主题的提醒

pub mod message;
pub mod reminder;
pub mod schedule;

pub use message::ReminderMessage;
pub use reminder::{
    EventTaskDetails, HttpPostTaskDetails, Reminder, ReminderDocument, ReminderKind,
    ReminderRequest, ReminderSchedule, TaskDetails, TaskType,
};
pub use schedule::{parse_cron, parse_epoch_millis, parse_instant, parse_rfc3339};
