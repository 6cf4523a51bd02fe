//! Push notification delivery.
//!
//! Sending goes through Firebase Cloud Messaging's HTTP v1 API, one request
//! per device token. Routes only see [`PushSender`], so tests swap in a
//! recording implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::FcmConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSummary {
    pub success_count: usize,
    pub failure_count: usize,
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push delivery is not configured")]
    NotConfigured,
}

#[async_trait]
pub trait PushSender: Send + Sync {
    /// Deliver `notification` to every token. A token that is rejected or
    /// cannot be reached counts as a failure; the batch always completes.
    async fn send(&self, tokens: &[String], notification: &Notification)
        -> Result<SendSummary, PushError>;
}

// ============================================================================
// FCM HTTP v1
// ============================================================================

pub struct FcmSender {
    client: reqwest::Client,
    config: FcmConfig,
}

impl FcmSender {
    pub fn new(config: FcmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.config.endpoint.trim_end_matches('/'),
            self.config.project_id
        )
    }
}

#[async_trait]
impl PushSender for FcmSender {
    async fn send(
        &self,
        tokens: &[String],
        notification: &Notification,
    ) -> Result<SendSummary, PushError> {
        let url = self.send_url();
        let mut summary = SendSummary::default();

        for token in tokens {
            let payload = serde_json::json!({
                "message": {
                    "token": token,
                    "notification": {
                        "title": notification.title,
                        "body": notification.body,
                    }
                }
            });

            let sent = self
                .client
                .post(&url)
                .bearer_auth(&self.config.access_token)
                .json(&payload)
                .send()
                .await;

            match sent {
                Ok(response) if response.status().is_success() => summary.success_count += 1,
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    warn!("FCM rejected token: {} {}", status, body);
                    summary.failure_count += 1;
                }
                Err(e) => {
                    warn!("FCM request failed: {}", e);
                    summary.failure_count += 1;
                }
            }
        }

        debug!(
            "FCM delivery finished: {} ok, {} failed",
            summary.success_count, summary.failure_count
        );
        Ok(summary)
    }
}

/// Used when no push credentials are configured.
pub struct DisabledPush;

#[async_trait]
impl PushSender for DisabledPush {
    async fn send(&self, _: &[String], _: &Notification) -> Result<SendSummary, PushError> {
        Err(PushError::NotConfigured)
    }
}

// ============================================================================
// Background message rendering
// ============================================================================

/// What a client shows for a push received while the app is in the background.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub data: Value,
}

const DEFAULT_TITLE: &str = "ข้อความใหม่";
const DEFAULT_BODY: &str = "คุณได้รับข้อความใหม่";
const DEFAULT_ICON: &str = "/LOGO.png";

pub fn render_background(payload: &Value) -> DisplayNotification {
    let notification = payload.get("notification");
    let text = |key: &str, default: &str| {
        notification
            .and_then(|n| n.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    };

    DisplayNotification {
        title: text("title", DEFAULT_TITLE),
        body: text("body", DEFAULT_BODY),
        icon: text("icon", DEFAULT_ICON),
        data: payload.get("data").cloned().unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn background_render_falls_back_to_defaults() {
        let shown = render_background(&json!({}));
        assert_eq!(shown.title, DEFAULT_TITLE);
        assert_eq!(shown.body, DEFAULT_BODY);
        assert_eq!(shown.icon, DEFAULT_ICON);
        assert_eq!(shown.data, Value::Null);
    }

    #[test]
    fn background_render_uses_payload_fields() {
        let shown = render_background(&json!({
            "notification": { "title": "Exam moved", "body": "Room E-201", "icon": "/bell.png" },
            "data": { "projectId": "p1" }
        }));
        assert_eq!(shown.title, "Exam moved");
        assert_eq!(shown.body, "Room E-201");
        assert_eq!(shown.icon, "/bell.png");
        assert_eq!(shown.data["projectId"], "p1");
    }

    #[test]
    fn send_url_joins_endpoint_and_project() {
        let sender = FcmSender::new(FcmConfig {
            project_id: "school-portal".into(),
            access_token: "t".into(),
            endpoint: "https://fcm.example.test/".into(),
        });
        assert_eq!(
            sender.send_url(),
            "https://fcm.example.test/v1/projects/school-portal/messages:send"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_counts_each_token_as_failed() {
        let sender = FcmSender::new(FcmConfig {
            project_id: "school-portal".into(),
            access_token: "t".into(),
            endpoint: "http://127.0.0.1:1".into(),
        });
        let tokens = vec!["tok-a".to_string(), "tok-b".to_string()];

        let summary = sender
            .send(&tokens, &Notification { title: "t".into(), body: "b".into() })
            .await
            .unwrap();

        assert_eq!(summary, SendSummary { success_count: 0, failure_count: 2 });
    }

    #[tokio::test]
    async fn rejected_tokens_do_not_stop_the_batch() {
        use axum::http::StatusCode;
        use axum::routing::post;
        use axum::{Json, Router};

        async fn accept_ok_tokens(Json(body): Json<Value>) -> StatusCode {
            match body["message"]["token"].as_str() {
                Some(token) if token.starts_with("ok-") => StatusCode::OK,
                _ => StatusCode::BAD_REQUEST,
            }
        }

        let app = Router::new().route(
            "/v1/projects/school-portal/messages:send",
            post(accept_ok_tokens),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let sender = FcmSender::new(FcmConfig {
            project_id: "school-portal".into(),
            access_token: "t".into(),
            endpoint: format!("http://{}", addr),
        });
        let tokens = ["ok-1", "stale", "ok-2"].map(String::from);

        let summary = sender
            .send(&tokens, &Notification { title: "t".into(), body: "b".into() })
            .await
            .unwrap();

        assert_eq!(summary, SendSummary { success_count: 2, failure_count: 1 });
    }

    #[tokio::test]
    async fn disabled_push_always_errors() {
        let result = DisabledPush
            .send(&["tok".to_string()], &Notification { title: "t".into(), body: "b".into() })
            .await;
        assert!(matches!(result, Err(PushError::NotConfigured)));
    }
}
