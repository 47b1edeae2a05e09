//! 命令处理
//!
//! 把消息总线上的入站命令转换为引擎调用，并生成带有稳定错误码的回复，
//! 命令发起方可以据此区分验证失败、冲突和系统故障。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use reminder_core::{SchedulerError, SchedulerResult};
use reminder_infrastructure::message_queue::CommandProcessor;

use crate::engine::ReminderEngine;

/// 入站命令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReminderCommand {
    CreateReminder { payload: Value },
    CreateSingleReminder { payload: Value },
    DeleteReminder { id: String },
    DeleteReminders,
}

impl ReminderCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ReminderCommand::CreateReminder { .. } => "CreateReminder",
            ReminderCommand::CreateSingleReminder { .. } => "CreateSingleReminder",
            ReminderCommand::DeleteReminder { .. } => "DeleteReminder",
            ReminderCommand::DeleteReminders => "DeleteReminders",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub client_error: bool,
}

impl From<&SchedulerError> for ErrorBody {
    fn from(err: &SchedulerError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.user_message(),
            client_error: err.is_client_error(),
        }
    }
}

/// 命令处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandReply {
    pub command: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl CommandReply {
    fn ok(command: &ReminderCommand, id: Option<String>) -> Self {
        Self {
            command: command.name().to_string(),
            success: true,
            id,
            error: None,
        }
    }

    fn failed(command: &ReminderCommand, id: Option<String>, err: &SchedulerError) -> Self {
        Self {
            command: command.name().to_string(),
            success: false,
            id,
            error: Some(err.into()),
        }
    }
}

#[derive(Clone)]
pub struct CommandHandler {
    engine: ReminderEngine,
}

impl CommandHandler {
    pub fn new(engine: ReminderEngine) -> Self {
        Self { engine }
    }

    pub async fn handle(&self, command: ReminderCommand) -> CommandReply {
        let result = match &command {
            ReminderCommand::CreateReminder { payload } => {
                self.engine.create_reminder_from_value(payload).await.map(Some)
            }
            ReminderCommand::CreateSingleReminder { payload } => self
                .engine
                .create_single_reminder_from_value(payload)
                .await
                .map(Some),
            ReminderCommand::DeleteReminder { id } => {
                self.engine.delete_reminder(id).await.map(|_| Some(id.clone()))
            }
            ReminderCommand::DeleteReminders => self.engine.delete_reminders().await.map(|_| None),
        };

        match result {
            Ok(id) => {
                info!("命令 {} 处理成功", command.name());
                CommandReply::ok(&command, id)
            }
            Err(e) => {
                warn!("命令 {} 处理失败: {}", command.name(), e);
                let id = match &command {
                    ReminderCommand::DeleteReminder { id } => Some(id.clone()),
                    _ => None,
                };
                CommandReply::failed(&command, id, &e)
            }
        }
    }
}

#[async_trait]
impl CommandProcessor for CommandHandler {
    async fn process(&self, body: &[u8]) -> SchedulerResult<Vec<u8>> {
        let command: ReminderCommand = serde_json::from_slice(body)?;
        let reply = self.handle(command).await;
        Ok(serde_json::to_vec(&reply)?)
    }
}
