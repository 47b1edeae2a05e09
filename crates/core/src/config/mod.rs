//! 配置管理
//!
//! 配置按以下顺序叠加，后者覆盖前者：
//!
//! 1. 加载器内置的默认值
//! 2. TOML配置文件（`--config` 指定，或默认路径 `config/reminder.toml`）
//! 3. 环境变量（前缀 `REMINDER_`，层级分隔符 `__`，例如 `REMINDER_SCHEDULER__TIME_ZONE`）
//!
//! 每个配置段提供 `validate()`，加载完成后统一校验。引擎本身不假设任何默认值，
//! 所需参数通过 [`EngineConfig`] 在构造时传入。

pub mod models;

pub use models::{
    ApiConfig, AppConfig, EngineConfig, LogFormat, MessageQueueConfig, ObservabilityConfig,
    RedisConfig, RepositoryKind, SchedulerSettings,
};
