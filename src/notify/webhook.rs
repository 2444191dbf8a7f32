//! POSTs order summaries as JSON to a configured endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{Notifier, NotifyError, OrderSummary};

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl WebhookConfig {
    pub fn new(endpoint: impl Into<String>) -> Self { Self { endpoint: endpoint.into(), timeout: Duration::from_secs(10) } }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct WebhookNotifier {
    client: Client,
    endpoint: reqwest::Url,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self, NotifyError> {
        let endpoint = reqwest::Url::parse(config.endpoint.trim())
            .map_err(|e| NotifyError::Config(format!("invalid webhook URL {:?}: {e}", config.endpoint)))?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str { "webhook" }

    async fn order_placed(&self, summary: &OrderSummary) -> Result<(), NotifyError> {
        let response = self.client.post(self.endpoint.clone()).json(summary).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_endpoint() {
        assert!(matches!(WebhookNotifier::new(WebhookConfig::new("not a url")), Err(NotifyError::Config(_))));
        assert!(WebhookNotifier::new(WebhookConfig::new("https://hooks.example.com/orders")).is_ok());
    }
}
