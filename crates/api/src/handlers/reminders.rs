use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use reminder_core::SchedulerError;

use crate::{
    error::{ApiError, ApiResult},
    response::{created, done, success},
    routes::AppState,
};

/// 创建周期提醒
///
/// 请求体按原始JSON接收，由引擎的边界解码器校验。
pub async fn create_reminder(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(candidate) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let id = state.engine.create_reminder_from_value(&candidate).await?;
    Ok(created(json!({ "id": id })))
}

/// 创建一次性提醒
pub async fn create_single_reminder(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(candidate) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let id = state
        .engine
        .create_single_reminder_from_value(&candidate)
        .await?;
    Ok(created(json!({ "id": id })))
}

pub async fn list_reminders(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let reminders = state.engine.get_reminders().await?;
    Ok(success(reminders))
}

pub async fn get_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let reminder = state
        .engine
        .get_reminder(&id)
        .await?
        .ok_or_else(|| SchedulerError::no_such_reminder(&id))?;
    Ok(success(reminder))
}

pub async fn delete_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.engine.delete_reminder(&id).await?;
    Ok(done(format!("提醒 {id} 已删除")))
}

/// 删除本实例管理的全部提醒
pub async fn delete_reminders(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.engine.delete_reminders().await?;
    Ok(done("所有提醒已删除"))
}
