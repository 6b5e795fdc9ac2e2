//! Integration tests for reconnection, backoff and the online/offline edges

mod common;

use common::{unreachable_capabilities, wait_until, MockPushServer};
use notify_push::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Token provider that fails its first `failures` calls
struct FlakyAuth {
    calls: Arc<AtomicU32>,
    failures: u32,
}

#[async_trait::async_trait]
impl AuthProvider for FlakyAuth {
    async fn pending_auth(&self, _pre_auth_url: &str) -> Result<PendingAuth> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(PushError::PreAuth(format!("attempt {} rejected", call)));
        }
        Ok(PendingAuth::Token(format!("tok-{}", call)))
    }
}

#[tokio::test]
async fn test_reconnect_replays_every_subscription() {
    verbose_println!("Testing resubscription after server drop...");

    let server = MockPushServer::start().await;
    let client = notify_push::builder()
        .capabilities(server.capabilities())
        .credentials(Credentials::new("alice", "secret"))
        .retry_interval(Duration::from_millis(50))
        .build()
        .await
        .unwrap();

    client.listen("files", |_: &TopicEvent| {});
    client.listen("notifications", |_: &TopicEvent| {});
    assert!(wait_until(TIMEOUT, || server.frames(0).len() == 4).await);

    server.drop_connections();

    assert!(wait_until(TIMEOUT, || server.frames(1).len() == 4).await);
    assert_eq!(
        server.frames(1),
        vec!["alice", "secret", "listen files", "listen notifications"]
    );
    verbose_println!("  Replayed frames: {:?}", server.frames(1));

    // The acknowledgement of the new handshake clears the failure
    assert!(wait_until(TIMEOUT, || client.error_count() == 0).await);
    assert_eq!(server.accepted(), 2);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_error_count_grows_while_server_unreachable() {
    let client = notify_push::builder()
        .capabilities(unreachable_capabilities().await)
        .credentials(Credentials::new("alice", "secret"))
        .retry_interval(Duration::from_millis(10))
        .build()
        .await
        .unwrap();

    assert!(client.listen("files", |_: &TopicEvent| {}));
    assert!(wait_until(TIMEOUT, || client.error_count() >= 3).await);
    verbose_println!("  Error count reached {}", client.error_count());

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_never_reconnect_stops_after_first_failure() {
    let client = notify_push::builder()
        .capabilities(unreachable_capabilities().await)
        .credentials(Credentials::new("alice", "secret"))
        .reconnect_strategy(NeverReconnect)
        .build()
        .await
        .unwrap();

    client.listen("files", |_: &TopicEvent| {});
    assert!(wait_until(TIMEOUT, || client.error_count() == 1).await);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.error_count(), 1);
    assert_eq!(client.connection_state(), ConnectionState::Closed);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_handshake_not_acknowledged_keeps_error_count() {
    let server = MockPushServer::without_auth_ack().await;
    let client = notify_push::builder()
        .capabilities(server.capabilities())
        .credentials(Credentials::new("alice", "wrong"))
        .retry_interval(Duration::from_millis(20))
        .build()
        .await
        .unwrap();

    client.listen("files", |_: &TopicEvent| {});
    assert!(wait_until(TIMEOUT, || server.frames(0).len() == 3).await);

    server.drop_connections();
    assert!(wait_until(TIMEOUT, || server.frames(1).len() == 3).await);
    server.drop_connections();
    assert!(wait_until(TIMEOUT, || server.accepted() == 3).await);

    assert!(client.error_count() >= 2);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_pre_auth_failure_joins_backoff() {
    let server = MockPushServer::start().await;
    let calls = Arc::new(AtomicU32::new(0));
    let client = notify_push::builder()
        .capabilities(server.capabilities())
        .auth(FlakyAuth {
            calls: Arc::clone(&calls),
            failures: 2,
        })
        .retry_interval(Duration::from_millis(10))
        .build()
        .await
        .unwrap();

    client.listen("files", |_: &TopicEvent| {});

    assert!(wait_until(TIMEOUT, || server.frames(0).len() == 3).await);
    assert_eq!(server.frames(0), vec!["", "tok-3", "listen files"]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(wait_until(TIMEOUT, || client.error_count() == 0).await);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_offline_closes_channel_and_suppresses_retry() {
    verbose_println!("Testing offline/online edges...");

    let server = MockPushServer::start().await;
    let client = notify_push::builder()
        .capabilities(server.capabilities())
        .credentials(Credentials::new("alice", "secret"))
        .retry_interval(Duration::from_millis(10))
        .build()
        .await
        .unwrap();

    client.listen("files", |_: &TopicEvent| {});
    assert!(wait_until(TIMEOUT, || client.connection_state() == ConnectionState::Open).await);

    client.network_offline();
    assert!(!client.is_online());
    assert!(wait_until(TIMEOUT, || server.live() == 0).await);

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(server.accepted(), 1);
    assert_eq!(client.connection_state(), ConnectionState::Idle);

    client.network_online();
    assert!(wait_until(TIMEOUT, || server.frames(1).len() == 3).await);
    assert_eq!(server.frames(1), vec!["alice", "secret", "listen files"]);
    assert_eq!(server.accepted(), 2);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_listen_while_offline_waits_for_online_edge() {
    let server = MockPushServer::start().await;
    let client = notify_push::builder()
        .capabilities(server.capabilities())
        .credentials(Credentials::new("alice", "secret"))
        .online(false)
        .build()
        .await
        .unwrap();

    client.listen("files", |_: &TopicEvent| {});
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.accepted(), 0);
    assert_eq!(client.subscribed_topics(), vec!["files"]);

    client.network_online();
    assert!(wait_until(TIMEOUT, || server.frames(0).len() == 3).await);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_online_edge_without_topics_does_not_connect() {
    let server = MockPushServer::start().await;
    let client = notify_push::builder()
        .capabilities(server.capabilities())
        .credentials(Credentials::new("alice", "secret"))
        .build()
        .await
        .unwrap();

    client.network_offline();
    client.network_online();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(server.accepted(), 0);
    assert_eq!(client.connection_state(), ConnectionState::Idle);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_online_edge_resets_error_count_and_skips_timer() {
    let server = MockPushServer::without_auth_ack().await;
    let client = notify_push::builder()
        .capabilities(server.capabilities())
        .credentials(Credentials::new("alice", "secret"))
        .retry_interval(Duration::from_secs(3600))
        .build()
        .await
        .unwrap();

    client.listen("files", |_: &TopicEvent| {});
    assert!(wait_until(TIMEOUT, || server.frames(0).len() == 3).await);

    server.drop_connections();
    assert!(wait_until(TIMEOUT, || client.error_count() == 1).await);
    assert_eq!(client.connection_state(), ConnectionState::Closed);

    client.network_offline();
    assert_eq!(client.error_count(), 1);

    client.network_online();
    assert_eq!(client.error_count(), 0);
    assert!(wait_until(TIMEOUT, || server.frames(1).len() == 3).await);
    assert_eq!(client.error_count(), 0);

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_stops_reconnection() {
    let server = MockPushServer::start().await;
    let client = notify_push::builder()
        .capabilities(server.capabilities())
        .credentials(Credentials::new("alice", "secret"))
        .retry_interval(Duration::from_millis(10))
        .build()
        .await
        .unwrap();

    client.listen("files", |_: &TopicEvent| {});
    assert!(wait_until(TIMEOUT, || client.connection_state() == ConnectionState::Open).await);

    client.shutdown().await.unwrap();
    assert!(wait_until(TIMEOUT, || server.live() == 0).await);

    client.listen("notifications", |_: &TopicEvent| {});
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.accepted(), 1);
}
