//! notify_push listener
//!
//! Discovers the server's push capability, listens on the configured topics
//! and logs every event until Ctrl+C.
//!
//! Usage:
//!   cargo run --bin notify_push_listen
//!
//! Environment variables:
//!   LISTENER_CONFIG_PATH - Config file (default: config/listener_config.yaml)
//!   NOTIFY_PUSH_USERNAME - Overrides `username`
//!   NOTIFY_PUSH_PASSWORD - Overrides `password`

use anyhow::{Context, Result};
use notify_push::{discover_capabilities, Credentials, PushClient, SharedCapabilities, TopicEvent};
use notify_push_listener::bin_common::{
    init_tracing_with_level, load_config_from_env, ConfigType, ListenerConfig, ShutdownManager,
};
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load config first (before logging is initialized)
    let config_path = load_config_from_env(ConfigType::Listener);
    let config = ListenerConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    init_tracing_with_level(&config.log_level);
    config.log();

    let credentials = Credentials::new(
        config.username.clone().unwrap_or_default(),
        config.password.clone().unwrap_or_default(),
    );

    let http = reqwest::Client::new();
    let capabilities =
        discover_capabilities(&http, &config.server_url, Some(&credentials)).await?;
    if capabilities.is_none() {
        warn!("{} does not offer push notifications", config.server_url);
        return Ok(());
    }

    let client = PushClient::builder()
        .capabilities(SharedCapabilities::new(capabilities))
        .credentials(credentials)
        .retry_interval(Duration::from_millis(config.retry_interval_ms))
        .dispatch_capacity(config.dispatch_capacity)
        .http_client(http)
        .build()
        .await?;

    info!("Server push types: {}", client.supported_types().join(", "));

    for topic in &config.topics {
        client.listen(topic, |event: &TopicEvent| match &event.body {
            Some(body) => info!("{} {}", event.topic, body),
            None => info!("{}", event.topic),
        });
    }

    print_banner("notify_push listener", &config.topics);

    let shutdown = ShutdownManager::new();
    shutdown.spawn_signal_handler();
    shutdown.wait().await;

    client.shutdown().await?;
    print_shutdown("notify_push listener");
    Ok(())
}

fn print_banner(name: &str, topics: &[String]) {
    info!("");
    info!("========================================");
    info!("Starting {}", name);
    info!("Listening on {} topic(s)", topics.len());
    info!("Press Ctrl+C to stop");
    info!("========================================");
    info!("");
}

fn print_shutdown(name: &str) {
    info!("");
    info!("========================================");
    info!("{} stopped gracefully", name);
    info!("========================================");
}
