//! Relay channel adapter: a WebSocket client carrying JSON text frames.
//!
//! # How the relay connection works (for beginners)
//!
//! The host never accepts inbound connections.  It dials out to the relay
//! server, which forwards frames between the host and whichever controller
//! is paired with it.  Every frame is a JSON object `{"event": .., "data": ..}`.
//!
//! [`RelayClient::run`] is a reconnect loop:
//!
//! 1. Dial the relay.  On failure, wait `reconnect_interval` and try again.
//! 2. Report `Connected` (first time) or `Reconnected` (later) to the agent.
//! 3. Pump frames both ways until the socket drops (`Disconnected`, go to 1)
//!    or the relay closes the channel (`Closed`, stop for good).
//!
//! When the agent drops its outbound sender the adapter sends a Close frame
//! and exits.  Outbound messages produced while no socket is up are discarded
//! on the next connect rather than replayed late.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use deskrelay_core::{decode_inbound, encode_outbound, OutboundMessage, ProtocolError};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::application::agent::AgentEvent;
use crate::application::lifecycle::ChannelEvent;

/// Errors raised by the relay adapter.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to connect to relay at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: WsError,
    },
    #[error("relay transport error: {0}")]
    Transport(#[from] WsError),
    #[error("relay protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Relay connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// `ws://` or `wss://` URL of the relay.
    pub url: String,
    pub reconnect_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/relay".to_string(),
            reconnect_interval: Duration::from_secs(1),
        }
    }
}

/// How one connected session ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// Socket dropped; reconnect.
    Dropped(String),
    /// The relay closed the channel; do not reconnect.
    Closed(String),
    /// The agent is gone; nothing left to relay for.
    AgentGone,
}

type RelaySocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// The host's side of the relay channel.
pub struct RelayClient {
    config: RelayConfig,
}

impl RelayClient {
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Spawns [`RelayClient::run`] on the runtime.
    pub fn spawn(
        self,
        running: Arc<AtomicBool>,
        outbound: UnboundedReceiver<OutboundMessage>,
        events: UnboundedSender<AgentEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(running, outbound, events))
    }

    /// Runs the reconnect loop until the channel is closed, the agent goes
    /// away, or `running` is cleared.
    pub async fn run(
        self,
        running: Arc<AtomicBool>,
        mut outbound: UnboundedReceiver<OutboundMessage>,
        events: UnboundedSender<AgentEvent>,
    ) {
        let mut connected_before = false;

        while running.load(Ordering::Relaxed) {
            match self.connect().await {
                Ok(socket) => {
                    info!(url = %self.config.url, "connected to relay");
                    if discard_stale(&mut outbound).is_err() {
                        return;
                    }

                    let event = if connected_before {
                        ChannelEvent::Reconnected
                    } else {
                        ChannelEvent::Connected
                    };
                    connected_before = true;
                    if events.send(AgentEvent::Channel(event)).is_err() {
                        return;
                    }

                    match pump(socket, &mut outbound, &events).await {
                        SessionEnd::Dropped(reason) => {
                            let _ = events.send(AgentEvent::Channel(ChannelEvent::Disconnected {
                                reason,
                            }));
                        }
                        SessionEnd::Closed(reason) => {
                            let _ = events
                                .send(AgentEvent::Channel(ChannelEvent::Closed { reason }));
                            return;
                        }
                        SessionEnd::AgentGone => return,
                    }
                }
                Err(e) => warn!("{e}"),
            }

            if running.load(Ordering::Relaxed) {
                debug!(
                    "retrying relay connection in {:?}",
                    self.config.reconnect_interval
                );
                tokio::time::sleep(self.config.reconnect_interval).await;
            }
        }

        info!("relay adapter stopped");
        let _ = events.send(AgentEvent::Channel(ChannelEvent::Closed {
            reason: "local shutdown".to_string(),
        }));
    }

    async fn connect(&self) -> Result<RelaySocket, RelayError> {
        let (socket, _response) =
            connect_async(self.config.url.as_str())
                .await
                .map_err(|source| RelayError::Connect {
                    url: self.config.url.clone(),
                    source,
                })?;
        Ok(socket)
    }
}

/// Drops whatever the agent queued while no socket was up.
///
/// Returns `Err(())` when the agent has already gone away.
fn discard_stale(outbound: &mut UnboundedReceiver<OutboundMessage>) -> Result<(), ()> {
    let mut dropped = 0usize;
    loop {
        match outbound.try_recv() {
            Ok(_) => dropped += 1,
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => return Err(()),
        }
    }
    if dropped > 0 {
        warn!(dropped, "discarded messages queued while disconnected");
    }
    Ok(())
}

/// Moves frames in both directions until the session ends.
async fn pump(
    socket: RelaySocket,
    outbound: &mut UnboundedReceiver<OutboundMessage>,
    events: &UnboundedSender<AgentEvent>,
) -> SessionEnd {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            frame = stream.next() => {
                let ws_msg = match frame {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => return SessionEnd::Dropped(e.to_string()),
                    None => return SessionEnd::Dropped("relay stream ended".to_string()),
                };
                match ws_msg {
                    WsMessage::Text(text) => match decode_inbound(&text) {
                        Ok(msg) => {
                            let event = AgentEvent::Channel(ChannelEvent::Message(msg));
                            if events.send(event).is_err() {
                                return SessionEnd::AgentGone;
                            }
                        }
                        Err(ProtocolError::UnknownEvent(name)) => {
                            debug!(event = %name, "ignoring unknown relay event");
                        }
                        Err(e) => warn!("dropping relay frame: {e}"),
                    },
                    WsMessage::Binary(_) => warn!("unexpected binary frame from relay (ignored)"),
                    WsMessage::Ping(data) => debug!("relay ping ({} bytes)", data.len()),
                    WsMessage::Pong(_) => {}
                    WsMessage::Close(frame) => {
                        let reason = frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "closed by relay".to_string());
                        return SessionEnd::Closed(reason);
                    }
                    WsMessage::Frame(_) => debug!("raw frame from relay (ignored)"),
                }
            }
            msg = outbound.recv() => {
                let Some(msg) = msg else {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    return SessionEnd::AgentGone;
                };
                let text = match encode_outbound(&msg) {
                    Ok(t) => t,
                    Err(e) => {
                        error!("failed to encode {}: {e}", msg.event_name());
                        continue;
                    }
                };
                if let Err(e) = sink.send(WsMessage::Text(text)).await {
                    return SessionEnd::Dropped(e.to_string());
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
