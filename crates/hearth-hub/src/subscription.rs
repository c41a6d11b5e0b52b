//! Supervised push subscription keeping the state cache fresh.
//!
//! One background task owns the WebSocket connection to the hub. Its phase
//! is observable through a watch channel and it honours a shutdown signal
//! from any phase. Connection loss triggers a fixed-delay retry, forever;
//! the delay never grows and the task never gives up on its own.

use crate::cache::StateCache;
use crate::entities::{EntityState, HubConnectionConfig};
use crate::error::{HubError, HubResult};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

/// Delay between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Bound on each handshake step.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsRead = SplitStream<WsStream>;
type WsWrite = SplitSink<WsStream, Message>;

/// Observable phase of the subscription task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Disconnected,
    Authenticating,
    Subscribed,
}

/// Handle to the running subscription task.
pub struct SubscriptionHandle {
    state_rx: watch::Receiver<SubscriptionState>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Current phase.
    pub fn state(&self) -> SubscriptionState {
        *self.state_rx.borrow()
    }

    /// A receiver callers can watch for phase transitions.
    pub fn watch(&self) -> watch::Receiver<SubscriptionState> {
        self.state_rx.clone()
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the subscription task for the given hub.
pub fn spawn_subscription(config: HubConnectionConfig, cache: StateCache) -> SubscriptionHandle {
    let (state_tx, state_rx) = watch::channel(SubscriptionState::Disconnected);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(supervise(config, cache, state_tx, shutdown_rx));
    SubscriptionHandle {
        state_rx,
        shutdown_tx,
        task,
    }
}

async fn supervise(
    config: HubConnectionConfig,
    cache: StateCache,
    state_tx: watch::Sender<SubscriptionState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        match run_once(&config, &cache, &state_tx, &mut shutdown_rx).await {
            Ok(()) => break,
            Err(e) => {
                let _ = state_tx.send(SubscriptionState::Disconnected);
                tracing::warn!(
                    "State subscription dropped: {}; reconnecting in {}s",
                    e,
                    RECONNECT_DELAY.as_secs()
                );
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            _ = wait_shutdown(&mut shutdown_rx) => break,
        }
    }

    let _ = state_tx.send(SubscriptionState::Disconnected);
    tracing::info!("State subscription stopped");
}

/// One connection attempt. Returns `Ok(())` only when shutdown was
/// requested; every other exit is an error the supervisor retries.
async fn run_once(
    config: &HubConnectionConfig,
    cache: &StateCache,
    state_tx: &watch::Sender<SubscriptionState>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> HubResult<()> {
    let _ = state_tx.send(SubscriptionState::Authenticating);

    let (ws, _) = connect_async(config.websocket_url()).await?;
    let (mut write, mut read) = ws.split();

    authenticate(&mut write, &mut read, &config.token).await?;

    write.send(Message::Text(subscribe_message(1))).await?;
    let ack = next_json(&mut read).await?;
    if ack.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(HubError::InvalidResponse(
            "state_changed subscription rejected".to_string(),
        ));
    }

    let _ = state_tx.send(SubscriptionState::Subscribed);
    tracing::info!("Subscribed to hub state changes");

    loop {
        tokio::select! {
            _ = wait_shutdown(shutdown_rx) => {
                let _ = write.send(Message::Close(None)).await;
                return Ok(());
            }
            msg = read.next() => {
                match msg.ok_or(HubError::ConnectionClosed)?? {
                    Message::Text(text) => {
                        let value: Value = serde_json::from_str(&text)?;
                        apply_event(cache, &value).await;
                    }
                    Message::Ping(payload) => {
                        write.send(Message::Pong(payload)).await?;
                    }
                    Message::Close(_) => return Err(HubError::ConnectionClosed),
                    _ => {}
                }
            }
        }
    }
}

/// The hub's auth handshake: `auth_required` in, credentials out,
/// `auth_ok` back. Anything else fails this connection attempt.
async fn authenticate(write: &mut WsWrite, read: &mut WsRead, token: &str) -> HubResult<()> {
    let first = next_json(read).await?;
    if first.get("type").and_then(Value::as_str) != Some("auth_required") {
        return Err(HubError::InvalidResponse(
            "expected auth_required".to_string(),
        ));
    }

    write.send(Message::Text(auth_message(token))).await?;

    let reply = next_json(read).await?;
    match reply.get("type").and_then(Value::as_str) {
        Some("auth_ok") => Ok(()),
        _ => Err(HubError::AuthenticationFailed),
    }
}

async fn next_json(read: &mut WsRead) -> HubResult<Value> {
    let msg = timeout(HANDSHAKE_TIMEOUT, read.next())
        .await
        .map_err(|_| HubError::Timeout)?
        .ok_or(HubError::ConnectionClosed)??;
    Ok(serde_json::from_str(&msg.into_text()?)?)
}

/// Block until the shutdown flag flips. A dropped sender counts as
/// shutdown.
async fn wait_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

fn auth_message(token: &str) -> String {
    serde_json::json!({ "type": "auth", "access_token": token }).to_string()
}

fn subscribe_message(id: u64) -> String {
    serde_json::json!({
        "id": id,
        "type": "subscribe_events",
        "event_type": "state_changed"
    })
    .to_string()
}

/// Overwrite the cache slot named by a `state_changed` event. Events
/// without a new state (entity removed) leave the slot to age out via TTL.
async fn apply_event(cache: &StateCache, message: &Value) {
    if message.get("type").and_then(Value::as_str) != Some("event") {
        return;
    }
    let Some(event) = message.get("event") else {
        return;
    };
    if event.get("event_type").and_then(Value::as_str) != Some("state_changed") {
        return;
    }
    let Some(data) = event.get("data") else {
        return;
    };

    let new_state = data.get("new_state").cloned().unwrap_or(Value::Null);
    if new_state.is_null() {
        if let Some(entity_id) = data.get("entity_id").and_then(Value::as_str) {
            tracing::debug!("state_changed without new state for {}", entity_id);
        }
        return;
    }

    match serde_json::from_value::<EntityState>(new_state) {
        Ok(state) => {
            tracing::debug!("State push: {} -> {}", state.entity_id, state.state);
            cache.put(state).await;
        }
        Err(e) => tracing::warn!("Unparseable state_changed payload: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_message_shape() {
        let msg: Value = serde_json::from_str(&auth_message("secret")).unwrap();
        assert_eq!(msg["type"], "auth");
        assert_eq!(msg["access_token"], "secret");
    }

    #[test]
    fn test_subscribe_message_shape() {
        let msg: Value = serde_json::from_str(&subscribe_message(7)).unwrap();
        assert_eq!(msg["id"], 7);
        assert_eq!(msg["type"], "subscribe_events");
        assert_eq!(msg["event_type"], "state_changed");
    }

    #[tokio::test]
    async fn test_apply_event_overwrites_cache_slot() {
        let cache = StateCache::new();
        let event = serde_json::json!({
            "id": 1,
            "type": "event",
            "event": {
                "event_type": "state_changed",
                "data": {
                    "entity_id": "light.kitchen",
                    "new_state": {
                        "entity_id": "light.kitchen",
                        "state": "on",
                        "attributes": { "friendly_name": "Kitchen Light" }
                    }
                }
            }
        });

        apply_event(&cache, &event).await;

        let state = cache.get("light.kitchen").await.unwrap();
        assert_eq!(state.state, "on");
        assert_eq!(state.display_name(), "Kitchen Light");
    }

    #[tokio::test]
    async fn test_apply_event_ignores_other_messages() {
        let cache = StateCache::new();

        apply_event(&cache, &serde_json::json!({ "type": "result", "success": true })).await;
        apply_event(
            &cache,
            &serde_json::json!({
                "type": "event",
                "event": { "event_type": "call_service", "data": {} }
            }),
        )
        .await;
        // Removal: new_state is null, slot untouched.
        apply_event(
            &cache,
            &serde_json::json!({
                "type": "event",
                "event": {
                    "event_type": "state_changed",
                    "data": { "entity_id": "light.gone", "new_state": null }
                }
            }),
        )
        .await;

        assert_eq!(cache.stats().await.total_entries, 0);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_reconnect_loop() {
        // Connection refused immediately; the task sits in its retry delay.
        let config = HubConnectionConfig::new("http://127.0.0.1:9", "token");
        let handle = spawn_subscription(config, StateCache::new());

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown().await;
    }
}
