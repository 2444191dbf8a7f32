//! Publishes domain events to NATS as JSON.

use async_trait::async_trait;

use super::{Notifier, NotifyError};
use crate::domain::events::DomainEvent;

pub struct NatsNotifier {
    client: async_nats::Client,
    subject_prefix: String,
}

impl NatsNotifier {
    pub fn new(client: async_nats::Client, subject_prefix: impl Into<String>) -> Self {
        Self { client, subject_prefix: subject_prefix.into() }
    }

    pub async fn connect(url: &str, subject_prefix: impl Into<String>) -> Result<Self, NotifyError> {
        let client = async_nats::connect(url).await.map_err(|e| NotifyError::Nats(e.to_string()))?;
        Ok(Self::new(client, subject_prefix))
    }
}

/// `<prefix>.order` or `<prefix>.product`.
pub fn subject_for(prefix: &str, event: &DomainEvent) -> String {
    let kind = match event {
        DomainEvent::Order(_) => "order",
        DomainEvent::Product(_) => "product",
    };
    format!("{prefix}.{kind}")
}

#[async_trait]
impl Notifier for NatsNotifier {
    fn name(&self) -> &'static str { "nats" }

    async fn publish(&self, event: &DomainEvent) -> Result<(), NotifyError> {
        let payload = serde_json::to_vec(event)?;
        self.client
            .publish(subject_for(&self.subject_prefix, event), payload.into())
            .await
            .map_err(|e| NotifyError::Nats(e.to_string()))
    }
}
