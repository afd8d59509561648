//! Feed WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Register the session with the broadcaster and forward its queue
//! - Lifecycle: ping/pong + idle timeout
//! - Inbound data frames are ignored; the feed is subscribe-only

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use crate::app_state::AppState;

pub async fn feed_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    if app.is_draining() {
        return (StatusCode::SERVICE_UNAVAILABLE, "draining").into_response();
    }
    app.metrics().feed_upgrades.inc(&[]);
    ws.on_upgrade(move |socket| run_session(app, socket))
}

async fn run_session(app: AppState, socket: WebSocket) {
    let feed = &app.cfg().feed;
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(feed.subscriber_queue);

    let broadcaster = app.broadcaster();
    let id = broadcaster.subscribe(out_tx);
    tracing::debug!(subscriber = id.get(), subscribers = broadcaster.len(), "feed session opened");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // drain began between the upgrade and the subscribe; close_all missed us
    if app.is_draining() {
        broadcaster.unsubscribe(id);
        let _ = ws_tx.send(Message::Close(None)).await;
        return;
    }

    let ping_every = Duration::from_millis(feed.ping_interval_ms);
    let idle_timeout = Duration::from_millis(feed.idle_timeout_ms);

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // broadcaster -> client; None means the server is draining
            maybe_out = out_rx.recv() => {
                let Some(m) = maybe_out else {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                };
                if ws_tx.send(m).await.is_err() {
                    break;
                }
            }

            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                last_activity = Instant::now();

                match msg {
                    Message::Ping(payload) => {
                        if ws_tx.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    Message::Pong(_) | Message::Text(_) | Message::Binary(_) => {}
                }
            }

            _ = ping_tick.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            _ = tokio::time::sleep_until(last_activity + idle_timeout) => {
                tracing::debug!(subscriber = id.get(), "feed session idle timeout");
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
        }
    }

    broadcaster.unsubscribe(id);
    tracing::debug!(subscriber = id.get(), subscribers = broadcaster.len(), "feed session closed");
}
