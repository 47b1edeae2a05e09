use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info, warn};

use reminder_api::create_app;
use reminder_core::config::RepositoryKind;
use reminder_core::traits::{DistributedLock, MessageProducer, ReminderRepository};
use reminder_core::{AppConfig, ServiceContainer, ServiceContext};
use reminder_dispatcher::{CommandHandler, ReminderEngine};
use reminder_infrastructure::{
    InMemoryDistributedLock, InMemoryMessageProducer, InMemoryReminderRepository,
    RabbitMQCommandConsumer, RabbitMQProducer, RedisDistributedLock, ReqwestHttpClient,
};

/// 主应用程序
pub struct Application {
    config: AppConfig,
    engine: ReminderEngine,
}

impl Application {
    /// 装配适配器并初始化调度引擎
    ///
    /// 引擎初始化失败时返回错误，进程不应继续启动。
    pub async fn new(config: AppConfig) -> Result<Self> {
        let context = create_service_context(&config).await?;
        let engine_config = config.engine_config().context("解析调度配置失败")?;

        let engine = ReminderEngine::with_tokio_driver(context, engine_config);
        engine.init().await.context("初始化提醒调度引擎失败")?;
        info!(
            "提醒调度引擎已启动，时区: {}，已恢复 {} 个定时器",
            config.scheduler.time_zone,
            engine.active_timer_count().await
        );

        Ok(Self { config, engine })
    }

    pub fn engine(&self) -> &ReminderEngine {
        &self.engine
    }

    /// 运行API服务器和命令消费者，直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let mut handles = Vec::new();

        if self.config.api.enabled {
            handles.push(self.start_api(shutdown_rx.resubscribe()).await?);
        }

        if self.config.message_queue.enabled && self.config.message_queue.consume_commands {
            handles.push(self.start_command_consumer(shutdown_rx.resubscribe()).await?);
        }

        let _ = shutdown_rx.recv().await;
        info!("应用收到关闭信号");

        for handle in handles {
            let _ = handle.await;
        }

        self.engine
            .destroy()
            .await
            .context("关闭提醒调度引擎失败")?;
        info!("所有组件已停止");
        Ok(())
    }

    async fn start_api(
        &self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<tokio::task::JoinHandle<()>> {
        let app = create_app(self.engine.clone(), &self.config.api);

        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;
        info!("API服务器启动在 http://{}", self.config.api.bind_address);

        Ok(tokio::spawn(async move {
            let result = axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await;
            match result {
                Ok(()) => info!("API服务器已停止"),
                Err(e) => error!("API服务器运行失败: {}", e),
            }
        }))
    }

    async fn start_command_consumer(
        &self,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<tokio::task::JoinHandle<()>> {
        let consumer = RabbitMQCommandConsumer::connect(self.config.message_queue.clone())
            .await
            .context("连接命令队列失败")?;
        let handler = CommandHandler::new(self.engine.clone());

        Ok(tokio::spawn(async move {
            if let Err(e) = consumer.run(&handler, shutdown_rx).await {
                error!("命令消费者运行失败: {}", e);
            }
            if let Err(e) = consumer.close().await {
                warn!("关闭命令消费者失败: {}", e);
            }
        }))
    }
}

/// 按配置选择适配器并组装服务上下文
async fn create_service_context(config: &AppConfig) -> Result<ServiceContext> {
    let repository: Arc<dyn ReminderRepository> = match config.scheduler.repository {
        RepositoryKind::Memory => Arc::new(InMemoryReminderRepository::new()),
    };

    let lock: Arc<dyn DistributedLock> = if config.redis.enabled {
        info!(
            "连接Redis分布式锁: {}:{}/{}",
            config.redis.host, config.redis.port, config.redis.database
        );
        Arc::new(
            RedisDistributedLock::connect(&config.redis)
                .await
                .context("连接Redis失败")?,
        )
    } else {
        warn!("未启用Redis，使用进程内锁，多实例部署时不能保证单次执行");
        Arc::new(InMemoryDistributedLock::new())
    };

    let producer: Arc<dyn MessageProducer> = if config.message_queue.enabled {
        info!("使用RabbitMQ事件生产者: {}", mask_amqp_url(&config.message_queue.url));
        Arc::new(RabbitMQProducer::new(config.message_queue.clone()))
    } else {
        info!("未启用消息队列，事件消息只保存在内存中");
        Arc::new(InMemoryMessageProducer::new())
    };

    let mut container = ServiceContainer::new();
    container
        .register_repository(repository)
        .register_lock(lock)
        .register_http_client(Arc::new(ReqwestHttpClient::new()))
        .register_producer(producer);

    container.build().context("组装服务上下文失败")
}

/// 屏蔽AMQP URL中的敏感信息
fn mask_amqp_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let mut masked = url.to_string();
            masked.replace_range(colon_pos + 1..at_pos, "***");
            return masked;
        }
    }
    url.to_string()
}
