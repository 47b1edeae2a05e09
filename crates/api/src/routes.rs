use axum::{
    routing::{get, post},
    Router,
};

use reminder_dispatcher::ReminderEngine;

use crate::handlers::{
    health::health_check,
    reminders::{
        create_reminder, create_single_reminder, delete_reminder, delete_reminders, get_reminder,
        list_reminders,
    },
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub engine: ReminderEngine,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 提醒管理API
        .route(
            "/api/reminders",
            get(list_reminders)
                .post(create_reminder)
                .delete(delete_reminders),
        )
        .route("/api/single-reminders", post(create_single_reminder))
        .route(
            "/api/reminders/{id}",
            get(get_reminder).delete(delete_reminder),
        )
        .with_state(state)
}
