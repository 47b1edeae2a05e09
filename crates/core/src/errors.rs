use thiserror::Error;

/// 提醒数据验证错误
///
/// 每个变体对应一种入站数据的校验失败原因，由边界解码器产生，
/// 原样传递给命令发起方，调用方可据此区分失败原因。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("缺少必要属性: time、taskType 或任务详情")]
    MissingEssentialProperties,

    #[error("id 必须是字符串")]
    InvalidIdType,

    #[error("time 类型无效")]
    InvalidTimeType,

    #[error("无效的时间: {time} - {reason}")]
    InvalidTime { time: String, reason: String },

    #[error("taskType 必须是字符串")]
    InvalidTaskTypeType,

    #[error("不支持的任务类型: {task_type}")]
    InvalidTaskType { task_type: String },

    #[error("任务类型 {task_type} 的任务详情无效")]
    InvalidTaskDetailsType { task_type: String },
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::MissingEssentialProperties => "MISSING_ESSENTIAL_PROPERTIES",
            ValidationError::InvalidIdType => "INVALID_ID_TYPE",
            ValidationError::InvalidTimeType => "INVALID_TIME_TYPE",
            ValidationError::InvalidTime { .. } => "INVALID_TIME",
            ValidationError::InvalidTaskTypeType => "INVALID_TASK_TYPE_TYPE",
            ValidationError::InvalidTaskType { .. } => "INVALID_TASK_TYPE",
            ValidationError::InvalidTaskDetailsType { .. } => "INVALID_TASK_DETAILS_TYPE",
        }
    }
}

/// 调度器错误类型定义
#[derive(Debug, Error, Clone)]
pub enum SchedulerError {
    #[error("提醒数据验证失败: {0}")]
    Validation(#[from] ValidationError),

    #[error("提醒已存在: id={id}")]
    ReminderAlreadyExists { id: String },

    #[error("提醒不存在: id={id}")]
    NoSuchReminder { id: String },

    #[error("服务初始化失败: {0}")]
    UnableToInit(String),

    #[error("存储操作失败: {0}")]
    Storage(String),

    #[error("分布式锁操作失败: {0}")]
    Lock(String),

    #[error("HTTP回调失败: {0}")]
    HttpDispatch(String),

    #[error("未识别的事件主题: {topic}")]
    UnknownTopic { topic: String },

    #[error("消息队列操作失败: {0}")]
    MessageQueue(String),

    #[error("数据序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    pub fn storage_error<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }
    pub fn already_exists<S: Into<String>>(id: S) -> Self {
        Self::ReminderAlreadyExists { id: id.into() }
    }
    pub fn no_such_reminder<S: Into<String>>(id: S) -> Self {
        Self::NoSuchReminder { id: id.into() }
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// 调用方错误（验证失败、冲突），不应重试
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SchedulerError::Validation(_)
                | SchedulerError::ReminderAlreadyExists { .. }
                | SchedulerError::NoSuchReminder { .. }
        )
    }

    /// 基础设施错误，稍后重试可能成功
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SchedulerError::Storage(_)
                | SchedulerError::Lock(_)
                | SchedulerError::HttpDispatch(_)
                | SchedulerError::MessageQueue(_)
        )
    }

    /// 稳定的机器可读错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            SchedulerError::Validation(e) => e.error_code(),
            SchedulerError::ReminderAlreadyExists { .. } => "REMINDER_ALREADY_EXISTS",
            SchedulerError::NoSuchReminder { .. } => "NO_SUCH_REMINDER",
            SchedulerError::UnableToInit(_) => "UNABLE_TO_INIT",
            SchedulerError::UnknownTopic { .. } => "UNKNOWN_TOPIC",
            SchedulerError::Configuration(_) => "CONFIGURATION_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            SchedulerError::Validation(e) => e.to_string(),
            SchedulerError::ReminderAlreadyExists { id } => format!("提醒 {id} 已存在"),
            SchedulerError::NoSuchReminder { id } => format!("提醒 {id} 不存在"),
            _ => "系统繁忙，请稍后重试".to_string(),
        }
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for SchedulerError {
    fn from(err: anyhow::Error) -> Self {
        SchedulerError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_and_validation_are_client_errors() {
        assert!(SchedulerError::already_exists("a").is_client_error());
        assert!(SchedulerError::no_such_reminder("a").is_client_error());
        assert!(SchedulerError::from(ValidationError::InvalidIdType).is_client_error());
        assert!(!SchedulerError::storage_error("down").is_client_error());
    }

    #[test]
    fn test_error_codes_pass_validation_cause_through() {
        let err = SchedulerError::from(ValidationError::MissingEssentialProperties);
        assert_eq!(err.error_code(), "MISSING_ESSENTIAL_PROPERTIES");
        assert_eq!(
            SchedulerError::Lock("timeout".to_string()).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_user_message_hides_infrastructure_details() {
        let err = SchedulerError::Storage("connection refused 10.0.0.3".to_string());
        assert!(!err.user_message().contains("10.0.0.3"));
        assert!(err.is_retryable());
    }
}
