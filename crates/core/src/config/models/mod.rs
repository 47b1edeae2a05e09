pub mod api_observability;
pub mod app_config;
pub mod message_queue;
pub mod redis;
pub mod scheduler;

pub use api_observability::{ApiConfig, LogFormat, ObservabilityConfig};
pub use app_config::AppConfig;
pub use message_queue::MessageQueueConfig;
pub use redis::RedisConfig;
pub use scheduler::{EngineConfig, RepositoryKind, SchedulerSettings};
