use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::info;
use verse_core::config::TelexConfig;

use crate::message::{ChannelMessage, WebhookPayload};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to build webhook client: {0}")]
    Client(String),
    #[error("webhook request failed: {0}")]
    Transport(String),
    #[error("webhook rejected the message with status {status}")]
    Rejected { status: u16 },
}

#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Short label reported by health checks and logs.
    fn name(&self) -> &'static str;

    async fn post(&self, message: &ChannelMessage) -> Result<(), DeliveryError>;
}

pub struct WebhookChannel {
    http: reqwest::Client,
    url: String,
    bearer_token: Option<SecretString>,
}

impl WebhookChannel {
    pub fn new(
        url: impl Into<String>,
        bearer_token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| DeliveryError::Client(error.to_string()))?;
        Ok(Self { http, url: url.into(), bearer_token })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DeliveryChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn post(&self, message: &ChannelMessage) -> Result<(), DeliveryError> {
        let mut request = self.http.post(&self.url).json(&WebhookPayload::daily_verse(message));
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response =
            request.send().await.map_err(|error| DeliveryError::Transport(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected { status: status.as_u16() });
        }

        info!(
            event_name = "delivery.webhook.posted",
            reference = %message.reference,
            status = status.as_u16(),
            "daily verse posted to webhook"
        );
        Ok(())
    }
}

/// Used when no webhook is configured. Writes the message to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogOnlyChannel;

#[async_trait]
impl DeliveryChannel for LogOnlyChannel {
    fn name(&self) -> &'static str {
        "log_only"
    }

    async fn post(&self, message: &ChannelMessage) -> Result<(), DeliveryError> {
        info!(
            event_name = "delivery.log_only.posted",
            reference = %message.reference,
            message = %message.text,
            "no webhook configured; daily verse logged only"
        );
        Ok(())
    }
}

pub fn channel_from_config(
    config: &TelexConfig,
) -> Result<Arc<dyn DeliveryChannel>, DeliveryError> {
    match config.webhook_url() {
        Some(url) => Ok(Arc::new(WebhookChannel::new(
            url,
            config.bearer_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )?)),
        None => Ok(Arc::new(LogOnlyChannel)),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use verse_core::config::TelexConfig;

    use super::{
        channel_from_config, DeliveryChannel, DeliveryError, LogOnlyChannel, WebhookChannel,
    };
    use crate::message::ChannelMessage;

    fn telex_config(hook_id: Option<&str>) -> TelexConfig {
        TelexConfig {
            base_url: "https://ping.telex.im".to_string(),
            webhook_hook_id: hook_id.map(str::to_string),
            bearer_token: None,
            timeout_secs: 5,
        }
    }

    /// Accepts one connection, answers with `status_line`, and hands back the
    /// raw request it received.
    async fn one_shot_server(status_line: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
        let address = listener.local_addr().expect("listener address");

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept connection");
            let mut raw = Vec::new();
            let mut chunk = [0_u8; 1024];
            loop {
                let read = stream.read(&mut chunk).await.expect("read request");
                if read == 0 {
                    break;
                }
                raw.extend_from_slice(&chunk[..read]);
                if request_complete(&raw) {
                    break;
                }
            }
            let response =
                format!("HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            stream.write_all(response.as_bytes()).await.expect("write response");
            String::from_utf8_lossy(&raw).into_owned()
        });

        (format!("http://{address}/v1/webhooks/hook-1"), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let Some(head_end) = raw.windows(4).position(|window| window == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&raw[..head_end]);
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse().ok())?
            })
            .unwrap_or(0_usize);
        raw.len() - (head_end + 4) >= length
    }

    #[test]
    fn missing_hook_id_selects_log_only() {
        let channel = channel_from_config(&telex_config(None)).expect("channel");
        assert_eq!(channel.name(), "log_only");

        let channel = channel_from_config(&telex_config(Some("  "))).expect("channel");
        assert_eq!(channel.name(), "log_only");
    }

    #[test]
    fn hook_id_selects_webhook() {
        let channel = channel_from_config(&telex_config(Some("hook-1"))).expect("channel");
        assert_eq!(channel.name(), "webhook");
    }

    #[tokio::test]
    async fn log_only_channel_never_fails() {
        let message = ChannelMessage::new("Psalm 23:1", "The LORD is my shepherd");
        assert!(LogOnlyChannel.post(&message).await.is_ok());
    }

    #[tokio::test]
    async fn webhook_posts_payload_with_bearer_token() {
        let (url, server) = one_shot_server("200 OK").await;
        let channel = WebhookChannel::new(
            url,
            Some("token-abc".to_string().into()),
            Duration::from_secs(5),
        )
        .expect("webhook channel");

        channel
            .post(&ChannelMessage::new("John 1:5", "📖 Verse of the Day: John 1:5"))
            .await
            .expect("delivery succeeds");

        let request = server.await.expect("server task");
        assert!(request.starts_with("POST /v1/webhooks/hook-1 HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer token-abc"));
        assert!(request.contains("\"event_name\":\"daily_verse\""));
        assert!(request.contains("\"username\":\"Bible Verse Agent\""));
    }

    #[tokio::test]
    async fn webhook_non_success_status_is_an_error() {
        let (url, server) = one_shot_server("500 Internal Server Error").await;
        let channel =
            WebhookChannel::new(url, None, Duration::from_secs(5)).expect("webhook channel");

        let error = channel
            .post(&ChannelMessage::new("John 1:5", "text"))
            .await
            .expect_err("server rejects the post");

        assert!(matches!(error, DeliveryError::Rejected { status: 500 }));
        let request = server.await.expect("server task");
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }
}
