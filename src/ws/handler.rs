//! WebSocket upgrade handler and per-connection session loop

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{broadcast, oneshot};
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::game::world::DEFAULT_NAME;
use crate::game::{MatchHandle, PlayerId, SessionEvent};
use crate::util::rate_limit::SessionRateLimiter;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Errors writing to a client socket
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to send frame: {0}")]
    Send(axum::Error),
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    ClientClosed,
    SocketError,
    SendFailed,
    HeartbeatTimeout,
    Kicked,
    ServerShutdown,
}

/// Ping/pong liveness for one connection
#[derive(Debug, Default)]
struct Heartbeat {
    awaiting_pong: bool,
}

impl Heartbeat {
    /// Called on every heartbeat tick. Returns false if the previous ping
    /// was never answered, otherwise a new ping is due.
    fn on_tick(&mut self) -> bool {
        if self.awaiting_pong {
            return false;
        }
        self.awaiting_pong = true;
        true
    }

    fn on_pong(&mut self) {
        self.awaiting_pong = false;
    }
}

/// WebSocket upgrade handler. Anyone may connect.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let player_id = PlayerId::generate();
    info!(player_id = %player_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    let welcome = ServerMsg::Welcome {
        id: player_id.clone(),
        name: DEFAULT_NAME.to_string(),
    };
    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        warn!(player_id = %player_id, error = %e, "Failed to send welcome");
        return;
    }

    let reason = serve_session(
        &player_id,
        ws_sink,
        ws_stream,
        &state.match_handle,
        SessionRateLimiter::new(),
        state.config.heartbeat_interval,
    )
    .await;

    info!(player_id = %player_id, reason = ?reason, "WebSocket connection closed");
}

/// Register the connection with the match, pump it until it closes, then
/// report the disconnect
async fn serve_session<S, R>(
    player_id: &PlayerId,
    sink: S,
    stream: R,
    handle: &MatchHandle,
    rate_limiter: SessionRateLimiter,
    heartbeat_interval: Duration,
) -> CloseReason
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let snapshot_rx = handle.snapshot_tx.subscribe();
    let (kick_tx, kick_rx) = oneshot::channel();

    let connected = SessionEvent::Connected {
        player_id: player_id.clone(),
        kick: kick_tx,
    };
    if handle.events_tx.send(connected).await.is_err() {
        warn!(player_id = %player_id, "Match driver unavailable");
        return CloseReason::ServerShutdown;
    }

    let reason = run_session(
        player_id,
        sink,
        stream,
        handle,
        snapshot_rx,
        kick_rx,
        rate_limiter,
        heartbeat_interval,
    )
    .await;

    // The driver ignores this if an idle sweep already removed the player
    let _ = handle
        .events_tx
        .send(SessionEvent::Disconnected {
            player_id: player_id.clone(),
        })
        .await;

    reason
}

/// Pump one connection until it closes: client frames in, snapshots out,
/// heartbeat pings, and the driver's kick signal
#[allow(clippy::too_many_arguments)]
async fn run_session<S, R>(
    player_id: &PlayerId,
    mut sink: S,
    mut stream: R,
    handle: &MatchHandle,
    mut snapshot_rx: broadcast::Receiver<Arc<str>>,
    mut kick_rx: oneshot::Receiver<()>,
    rate_limiter: SessionRateLimiter,
    heartbeat_interval: Duration,
) -> CloseReason
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let mut ticker = interval_at(Instant::now() + heartbeat_interval, heartbeat_interval);
    let mut heartbeat = Heartbeat::default();

    loop {
        tokio::select! {
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if !rate_limiter.check_input() {
                            debug!(player_id = %player_id, "Rate limited client message");
                            continue;
                        }

                        match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(msg) => {
                                let event = SessionEvent::Message {
                                    player_id: player_id.clone(),
                                    msg,
                                };
                                if handle.events_tx.send(event).await.is_err() {
                                    return CloseReason::ServerShutdown;
                                }
                            }
                            Err(e) => {
                                debug!(player_id = %player_id, error = %e, "Dropping malformed client message");
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        debug!(player_id = %player_id, "Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // axum answers pings itself
                    }
                    Some(Ok(Message::Pong(_))) => heartbeat.on_pong(),
                    Some(Ok(Message::Close(_))) | None => {
                        return CloseReason::ClientClosed;
                    }
                    Some(Err(e)) => {
                        debug!(player_id = %player_id, error = %e, "WebSocket error");
                        return CloseReason::SocketError;
                    }
                }
            }

            snapshot = snapshot_rx.recv() => {
                match snapshot {
                    Ok(payload) => {
                        if let Err(e) = send_text(&mut sink, &payload).await {
                            debug!(player_id = %player_id, error = %e, "WebSocket send failed");
                            return CloseReason::SendFailed;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(player_id = %player_id, lagged_count = n, "Client lagged, skipping snapshots");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return CloseReason::ServerShutdown;
                    }
                }
            }

            _ = ticker.tick() => {
                if !heartbeat.on_tick() {
                    info!(player_id = %player_id, "Heartbeat missed, terminating connection");
                    return CloseReason::HeartbeatTimeout;
                }
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    return CloseReason::SendFailed;
                }
            }

            _ = &mut kick_rx => {
                let _ = sink.send(Message::Close(None)).await;
                return CloseReason::Kicked;
            }
        }
    }
}

/// Send a message over WebSocket
async fn send_msg<S>(sink: &mut S, msg: &ServerMsg) -> Result<(), WsError>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let json = serde_json::to_string(msg)?;
    send_text(sink, &json).await
}

/// Send an already-serialized payload
async fn send_text<S>(sink: &mut S, payload: &str) -> Result<(), WsError>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    sink.send(Message::Text(payload.to_string()))
        .await
        .map_err(|e| WsError::Send(axum::Error::new(e)))
}
