//! 提醒引擎依赖的外部协作者接口
//!
//! 引擎只通过这些trait访问存储、分布式锁和动作分发，具体实现位于
//! `reminder-infrastructure`。所有接口都是 `Send + Sync` 的异步trait，
//! 以 `Arc<dyn ...>` 形式注入。

pub mod dispatch;
pub mod lock;
pub mod repository;

pub use dispatch::{HttpActionClient, MessageProducer};
pub use lock::DistributedLock;
pub use repository::ReminderRepository;
