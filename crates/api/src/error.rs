use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reminder_core::SchedulerError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("调度器错误: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Scheduler(SchedulerError::Validation(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Scheduler(SchedulerError::ReminderAlreadyExists { .. }) => {
                StatusCode::CONFLICT
            }
            ApiError::Scheduler(SchedulerError::NoSuchReminder { .. }) => StatusCode::NOT_FOUND,
            ApiError::Scheduler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_message, error_type, suggestions) = match &self {
            ApiError::Scheduler(SchedulerError::Validation(e)) => (
                format!("提醒数据验证失败: {e}"),
                e.error_code().to_string(),
                vec![
                    "time、taskType 为必填字段".to_string(),
                    "HTTP_POST 提醒需要 httpPostTaskDetails.url，EVENT 提醒需要 eventTaskDetails.topic"
                        .to_string(),
                ],
            ),
            ApiError::Scheduler(e @ SchedulerError::ReminderAlreadyExists { .. }) => (
                e.user_message(),
                e.error_code().to_string(),
                vec![
                    "省略 id 字段由服务端生成".to_string(),
                    "或先删除已有提醒再重新创建".to_string(),
                ],
            ),
            ApiError::Scheduler(e @ SchedulerError::NoSuchReminder { .. }) => (
                e.user_message(),
                e.error_code().to_string(),
                vec!["使用 GET /api/reminders 查看所有提醒".to_string()],
            ),
            ApiError::Scheduler(e) => {
                error!("请求处理失败: {}", e);
                (
                    "系统内部错误".to_string(),
                    e.error_code().to_string(),
                    vec![
                        "系统遇到内部错误，请稍后重试".to_string(),
                        "查看 GET /health 检查系统状态".to_string(),
                    ],
                )
            }
            ApiError::BadRequest(msg) => (
                format!("请求参数错误: {msg}"),
                "BAD_REQUEST".to_string(),
                vec!["请检查请求格式和参数".to_string()],
            ),
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
