//! # Reminder API
//!
//! 提醒调度服务的REST接口，基于Axum构建，所有操作直接委托给 [`ReminderEngine`]。
//!
//! ## API 端点
//!
//! - `POST /api/reminders` - 创建周期提醒
//! - `POST /api/single-reminders` - 创建一次性提醒
//! - `GET /api/reminders` - 获取提醒列表
//! - `GET /api/reminders/{id}` - 获取提醒详情
//! - `DELETE /api/reminders/{id}` - 删除提醒
//! - `DELETE /api/reminders` - 删除本实例管理的全部提醒
//! - `GET /health` - 健康检查
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use reminder_api::create_app;
//!
//! let app = create_app(engine, &config.api);
//! let listener = tokio::net::TcpListener::bind(&config.api.bind_address).await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! ```bash
//! curl -X POST http://localhost:8080/api/reminders \
//!   -H "Content-Type: application/json" \
//!   -d '{
//!     "time": "0 0 9 * * MON-FRI",
//!     "payload": {"message": "stand-up"},
//!     "taskType": "HTTP_POST",
//!     "httpPostTaskDetails": {"url": "http://localhost:3000/hooks/standup"}
//!   }'
//! ```
//!
//! ## 错误响应
//!
//! 验证失败返回 400，id冲突返回 409，提醒不存在返回 404，其余错误返回 500。
//! 响应体的 `error.type` 为稳定的错误码。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use middleware::{cors_layer, request_logging, trace_layer};
use reminder_core::config::ApiConfig;
use reminder_dispatcher::ReminderEngine;
use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(engine: ReminderEngine, api_config: &ApiConfig) -> Router {
    let state = AppState { engine };

    let app = create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(TimeoutLayer::new(Duration::from_secs(
                api_config.request_timeout_seconds,
            )))
            .layer(axum::middleware::from_fn(request_logging)),
    );

    if api_config.cors_enabled {
        app.layer(cors_layer())
    } else {
        app
    }
}
