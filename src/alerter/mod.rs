pub mod webhook;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Alert body accepted by the alert endpoint: message, type, title, and a
/// free-form field map rendered by the receiver.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AlertPayload {
    pub message: String,
    pub alert_type: AlertType,
    pub title: String,
    pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Info,
    Warning,
    Danger,
}

/// Trait for alert delivery channels
#[async_trait]
pub trait AlertChannel: Send + Sync {
    /// Channel name
    fn name(&self) -> &str;

    /// Send a single alert; success is any 2xx response
    async fn send(&self, payload: &AlertPayload) -> Result<()>;
}

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_SECS: [u64; 2] = [1, 2];

/// Dispatch an alert with bounded retry and exponential backoff. Failures
/// are logged and swallowed; returns whether any attempt succeeded. A lost
/// alert never fails the batch that produced it.
pub async fn dispatch(channel: &dyn AlertChannel, payload: &AlertPayload) -> bool {
    for attempt in 1..=MAX_ATTEMPTS {
        match channel.send(payload).await {
            Ok(()) => {
                tracing::info!(channel = channel.name(), message = %payload.message, "alert sent");
                return true;
            }
            Err(e) => {
                tracing::warn!(
                    channel = channel.name(),
                    attempt,
                    error = %e,
                    "alert dispatch failed"
                );
                if attempt < MAX_ATTEMPTS {
                    let delay = BACKOFF_SECS[(attempt - 1) as usize];
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                }
            }
        }
    }
    tracing::error!(channel = channel.name(), "alert dropped after {} attempts", MAX_ATTEMPTS);
    false
}
