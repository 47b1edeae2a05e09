use async_trait::async_trait;
use reminder_core::models::ReminderMessage;
use reminder_core::traits::MessageProducer;
use reminder_core::{SchedulerError, SchedulerResult};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

const SUBSCRIBER_CAPACITY: usize = 1024;

/// 内存消息生产者
///
/// 记录已发布的消息并广播给订阅者，适用于嵌入式部署和测试。
#[derive(Debug)]
pub struct InMemoryMessageProducer {
    messages: RwLock<Vec<ReminderMessage>>,
    sender: broadcast::Sender<ReminderMessage>,
    connected: AtomicBool,
}

impl InMemoryMessageProducer {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            messages: RwLock::new(Vec::new()),
            sender,
            connected: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReminderMessage> {
        self.sender.subscribe()
    }

    pub async fn sent_messages(&self) -> Vec<ReminderMessage> {
        self.messages.read().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.messages.read().await.len()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryMessageProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageProducer for InMemoryMessageProducer {
    async fn connect(&self) -> SchedulerResult<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, message: &ReminderMessage) -> SchedulerResult<()> {
        if !self.is_connected() {
            return Err(SchedulerError::MessageQueue("生产者未连接".to_string()));
        }

        self.messages.write().await.push(message.clone());
        // 没有订阅者时发送失败是正常情况
        let _ = self.sender.send(message.clone());
        debug!("消息已发布到主题 {}: {}", message.topic, message.id);
        Ok(())
    }

    async fn destroy(&self) -> SchedulerResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_requires_connection() {
        let producer = InMemoryMessageProducer::new();
        let message = ReminderMessage::new("r1", "reminders", json!({"a": 1}));
        assert!(producer.send(&message).await.is_err());

        producer.connect().await.unwrap();
        let mut rx = producer.subscribe();
        producer.send(&message).await.unwrap();

        assert_eq!(producer.sent_count().await, 1);
        assert_eq!(rx.recv().await.unwrap(), message);
    }
}
