//! Storefront Orders - catalog, checkout and order admin service

use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_orders::notify::{NatsNotifier, Notifications, Notifier, WebhookConfig, WebhookNotifier};
use storefront_orders::storage::PgStore;
use storefront_orders::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let store = Arc::new(PgStore::connect(&config.database_url, config.max_connections).await?);
    store.migrate().await?;

    let state = AppState::new(store.clone(), store, notifications(&config).await, config.currency.clone(), config.status_policy);
    let app = router(state).layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive());

    let addr = config.socket_addr();
    tracing::info!(policy = ?config.status_policy, "storefront-orders listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

/// Sinks that fail to start are logged and skipped; orders still go through.
async fn notifications(config: &Config) -> Notifications {
    let mut sinks: Vec<Arc<dyn Notifier>> = Vec::new();
    if let Some(url) = &config.webhook_url {
        match WebhookNotifier::new(WebhookConfig::new(url.as_str()).with_timeout(config.notify_timeout)) {
            Ok(n) => sinks.push(Arc::new(n)),
            Err(e) => tracing::warn!(error = %e, "order webhook disabled"),
        }
    }
    if let Some(url) = &config.nats_url {
        match NatsNotifier::connect(url, config.nats_subject.as_str()).await {
            Ok(n) => sinks.push(Arc::new(n)),
            Err(e) => tracing::warn!(error = %e, "NATS events disabled"),
        }
    }
    let notifications = Notifications::new(sinks);
    if notifications.is_empty() {
        tracing::info!("no notification sinks configured");
    }
    notifications
}
