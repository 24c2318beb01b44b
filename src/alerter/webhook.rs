use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use super::{AlertChannel, AlertPayload};

/// Fixed timeout on outbound alert POSTs; deliberately short so a hung
/// endpoint cannot stall a cycle for long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Webhook alert channel: JSON POST to a configured URL.
pub struct WebhookChannel {
    url: String,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(url: &str) -> Self {
        let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "HTTP client build failed, falling back to defaults");
                reqwest::Client::new()
            }
        };
        Self { url: url.to_string(), client }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, payload: &AlertPayload) -> Result<()> {
        self.client
            .post(&self.url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
