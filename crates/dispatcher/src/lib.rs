//! 提醒调度引擎
//!
//! - `cron_utils`: CRON和一次性触发时间计算
//! - `timer` / `timer_registry`: 可取消的定时执行和按提醒id管理的注册表
//! - `engine`: 调度引擎聚合
//! - `commands`: 入站命令处理

pub mod commands;
pub mod cron_utils;
pub mod engine;
pub mod timer;
pub mod timer_registry;

pub use commands::{CommandHandler, CommandReply, ErrorBody, ReminderCommand};
pub use engine::{ReminderEngine, TaskOutcome};
pub use timer::{TimerCallback, TimerDriver, TimerHandle, TokioTimerDriver};
pub use timer_registry::TimerRegistry;
