//! # reminder-core
//!
//! 提醒调度服务的核心库：错误类型、配置模型、提醒数据模型、边界解码器、
//! 外部协作者接口和服务容器。本库不包含任何具体的存储或网络实现。

pub mod config;
pub mod container;
pub mod errors;
pub mod models;
pub mod traits;
pub mod validation;

pub use config::{AppConfig, EngineConfig};
pub use container::{ServiceContainer, ServiceContext};
pub use errors::{SchedulerError, SchedulerResult, ValidationError};
pub use models::{
    Reminder, ReminderKind, ReminderMessage, ReminderRequest, ReminderSchedule, TaskDetails,
    TaskType,
};
pub use validation::ReminderDecoder;
