//! Realtime change feed for the relational backend.
//!
//! Joins the Supabase realtime websocket (Phoenix channel protocol), one
//! topic per table, and publishes the matching entity kind whenever the
//! server pushes a row change. Subscribers then re-read through the facade,
//! so the payload itself is not inspected beyond identifying the table.
//!
//! The connection is supervised: heartbeats every 30 seconds keep it alive,
//! and any disconnect triggers a reconnect with capped exponential backoff.
//! Dropping the handle stops the listener.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::notifier::ChangeNotifier;
use crate::types::EntityKind;

use super::RemoteError;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const RECONNECT_CAP: Duration = Duration::from_secs(30);

/// Handle to the background listener task. Dropping it disconnects.
pub struct RealtimeHandle {
    task: tokio::task::JoinHandle<()>,
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start the realtime listener for every collection. Requires a tokio
/// runtime; the returned handle owns the background task.
pub fn spawn(base: &Url, api_key: &str, notifier: ChangeNotifier) -> Result<RealtimeHandle, RemoteError> {
    let endpoint = websocket_url(base, api_key)?;
    let task = tokio::spawn(run(endpoint, notifier));
    Ok(RealtimeHandle { task })
}

/// Realtime endpoint derived from the project base URL:
/// `wss://{host}/realtime/v1/websocket?apikey={key}&vsn=1.0.0`.
fn websocket_url(base: &Url, api_key: &str) -> Result<Url, RemoteError> {
    let mut url = base
        .join("realtime/v1/websocket")
        .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
    let scheme = match base.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => return Err(RemoteError::InvalidUrl(format!("scheme {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|_| RemoteError::InvalidUrl("could not set websocket scheme".to_string()))?;
    url.query_pairs_mut()
        .append_pair("apikey", api_key)
        .append_pair("vsn", "1.0.0");
    Ok(url)
}

async fn run(endpoint: Url, notifier: ChangeNotifier) {
    let mut backoff = Duration::from_secs(1);
    loop {
        match connect_async(endpoint.as_str()).await {
            Ok((socket, _)) => {
                log::info!("realtime: connected");
                backoff = Duration::from_secs(1);
                if let Err(err) = listen(socket, &notifier).await {
                    log::warn!("realtime: connection lost: {}", err);
                }
            }
            Err(err) => {
                log::warn!("realtime: connect failed: {}", err);
            }
        }
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(RECONNECT_CAP);
    }
}

async fn listen(
    socket: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    notifier: &ChangeNotifier,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let (mut sink, mut stream) = socket.split();
    let mut message_ref: u64 = 0;

    // One Phoenix channel per table.
    for kind in EntityKind::ALL {
        message_ref += 1;
        let join = json!({
            "topic": topic_for(kind),
            "event": "phx_join",
            "payload": {},
            "ref": message_ref.to_string(),
        });
        sink.send(Message::Text(join.to_string())).await?;
    }

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    heartbeat.tick().await; // immediate first tick

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                message_ref += 1;
                let ping = json!({
                    "topic": "phoenix",
                    "event": "heartbeat",
                    "payload": {},
                    "ref": message_ref.to_string(),
                });
                sink.send(Message::Text(ping.to_string())).await?;
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(kind) = changed_kind(&text) {
                            log::debug!("realtime: change pushed for {}", kind);
                            notifier.publish(kind);
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        sink.send(Message::Pong(payload)).await?;
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err),
                }
            }
        }
    }
}

fn topic_for(kind: EntityKind) -> String {
    format!("realtime:public:{}", kind.collection())
}

/// Which collection a pushed Phoenix message refers to, if it is a row
/// change at all. Replies, presence frames and heartbeat acks map to None.
fn changed_kind(raw: &str) -> Option<EntityKind> {
    let message: Value = serde_json::from_str(raw).ok()?;
    let event = message.get("event")?.as_str()?;
    if !matches!(
        event,
        "postgres_changes" | "INSERT" | "UPDATE" | "DELETE"
    ) {
        return None;
    }
    let topic = message.get("topic")?.as_str()?;
    let table = topic.strip_prefix("realtime:public:")?;
    EntityKind::from_collection(table)
}
