use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::ReminderMessage;
use crate::SchedulerResult;

/// HTTP回调客户端
#[async_trait]
pub trait HttpActionClient: Send + Sync {
    /// 将 payload 作为JSON请求体POST到 url
    ///
    /// 目标不可达、超时或返回非2xx状态码时返回错误。
    async fn send(&self, url: &str, payload: &Value, timeout: Duration) -> SchedulerResult<()>;
}

/// 事件消息生产者
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// 连接消息总线
    async fn connect(&self) -> SchedulerResult<()>;

    /// 发布消息到 `message.topic`
    async fn send(&self, message: &ReminderMessage) -> SchedulerResult<()>;

    /// 断开连接
    async fn destroy(&self) -> SchedulerResult<()>;
}
