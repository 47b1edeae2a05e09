use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use reminder_core::AppConfig;
use reminder_scheduler::app::Application;
use reminder_scheduler::shutdown::ShutdownManager;

fn test_config(api_enabled: bool, bind_address: &str) -> AppConfig {
    AppConfig::from_toml(&format!(
        r#"
[scheduler]
time_zone = "Asia/Shanghai"
min_task_duration_ms = 100

[api]
enabled = {api_enabled}
bind_address = "{bind_address}"
"#
    ))
    .unwrap()
}

#[tokio::test]
async fn test_embedded_application_lifecycle() {
    let app = Arc::new(
        Application::new(test_config(false, "127.0.0.1:0"))
            .await
            .unwrap(),
    );
    let id = app
        .engine()
        .create_reminder_from_value(&json!({
            "time": "0 0 9 * * *",
            "payload": {},
            "taskType": "EVENT",
            "eventTaskDetails": {"topic": "reminders"}
        }))
        .await
        .unwrap();
    assert!(app.engine().has_timer(&id).await);

    let shutdown_manager = ShutdownManager::new();
    let handle = {
        let app = Arc::clone(&app);
        let shutdown_rx = shutdown_manager.subscribe().await;
        tokio::spawn(async move { app.run(shutdown_rx).await })
    };

    shutdown_manager.shutdown().await;
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert!(result.is_ok());
    assert_eq!(app.engine().active_timer_count().await, 0);
}

#[tokio::test]
async fn test_api_served_until_shutdown() {
    let bind_address = "127.0.0.1:38127";
    let app = Arc::new(Application::new(test_config(true, bind_address)).await.unwrap());

    let shutdown_manager = ShutdownManager::new();
    let handle = {
        let app = Arc::clone(&app);
        let shutdown_rx = shutdown_manager.subscribe().await;
        tokio::spawn(async move { app.run(shutdown_rx).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{bind_address}/api/reminders"))
        .json(&json!({
            "id": "from-http",
            "time": "0 30 8 * * *",
            "payload": {"msg": "hi"},
            "taskType": "HTTP_POST",
            "httpPostTaskDetails": {"url": "http://localhost:3000/hook"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    assert!(app.engine().has_timer("from-http").await);

    let health: serde_json::Value = client
        .get(format!("http://{bind_address}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["activeTimers"], 1);

    shutdown_manager.shutdown().await;
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
