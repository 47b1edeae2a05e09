use async_trait::async_trait;
use reminder_core::traits::HttpActionClient;
use reminder_core::{SchedulerError, SchedulerResult};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 基于reqwest的HTTP回调客户端
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpActionClient for ReqwestHttpClient {
    async fn send(&self, url: &str, payload: &Value, timeout: Duration) -> SchedulerResult<()> {
        let start_time = Instant::now();

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| SchedulerError::HttpDispatch(format!("POST {url} 失败: {e}")))?;

        let status = response.status();
        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("读取响应体失败: {e}"));
            warn!(
                "HTTP回调返回非成功状态: url={}, status={}, duration={}ms",
                url,
                status.as_u16(),
                elapsed_ms
            );
            return Err(SchedulerError::HttpDispatch(format!(
                "POST {url} 返回状态码 {}: {body}",
                status.as_u16()
            )));
        }

        debug!(
            "HTTP回调完成: url={}, status={}, duration={}ms",
            url,
            status.as_u16(),
            elapsed_ms
        );
        Ok(())
    }
}
