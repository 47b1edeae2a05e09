//! 提醒调度服务的基础设施适配器
//!
//! - 内存实现：仓储、分布式锁、消息生产者（嵌入式部署和测试）
//! - Redis分布式锁
//! - reqwest HTTP回调客户端
//! - RabbitMQ事件生产者和命令消费者
//! - 可观测性：指标和结构化日志

pub mod http_client;
pub mod in_memory_lock;
pub mod in_memory_producer;
pub mod in_memory_repository;
pub mod message_queue;
pub mod observability;
pub mod redis_lock;

pub use http_client::ReqwestHttpClient;
pub use in_memory_lock::InMemoryDistributedLock;
pub use in_memory_producer::InMemoryMessageProducer;
pub use in_memory_repository::InMemoryReminderRepository;
pub use message_queue::{CommandProcessor, RabbitMQCommandConsumer, RabbitMQProducer};
pub use observability::{MetricsCollector, StructuredLogger};
pub use redis_lock::{LockRetryPolicy, RedisDistributedLock};
