//! Notification socket: wire events and the reconnecting WebSocket task.

use std::time::Duration;

use futures::SinkExt;
use futures::StreamExt;
use log::debug;
use log::info;
use log::warn;
use serde::Deserialize;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::FeedEvent;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::error::FeedError;
use crate::model::Notification;

const CHANNEL_CAPACITY: usize = 64;

/// A socket event, framed as `{"event": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum SocketEvent {
    /// A new notification.
    #[serde(rename = "notify")]
    Notify(Notification),
    /// A notification was deleted; payload is the id.
    #[serde(rename = "deleteNotify")]
    DeleteNotify(String),
    /// A notification was marked read.
    #[serde(rename = "markAsRead")]
    MarkAsRead { id: String },
}

impl SocketEvent {
    pub fn encode(&self) -> Result<String, FeedError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, FeedError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl From<SocketEvent> for FeedEvent {
    fn from(event: SocketEvent) -> Self {
        match event {
            SocketEvent::Notify(notification) => FeedEvent::Pushed(notification),
            SocketEvent::DeleteNotify(id) => FeedEvent::Removed(id),
            SocketEvent::MarkAsRead { id } => FeedEvent::MarkedRead(id),
        }
    }
}

/// The two ends of an open socket subscription.
///
/// Dropping `outbound` or cancelling the shutdown token ends the connection.
#[derive(Debug)]
pub struct SocketChannel {
    pub inbound: mpsc::Receiver<SocketEvent>,
    pub outbound: mpsc::Sender<SocketEvent>,
}

/// Opens the socket subscription used by the feed.
///
/// Implementations own reconnection: the channel stays valid across
/// disconnects until `shutdown` is cancelled.
pub trait SocketConnector: Send + Sync {
    fn open(&self, shutdown: CancellationToken) -> SocketChannel;
}

/// [`SocketConnector`] over WebSocket with unbounded, fixed-delay
/// reconnection.
///
/// Events emitted while disconnected are buffered and sent after the next
/// connect. Events the server sent during an outage are not replayed.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: Url,
    reconnect_delay: Duration,
}

impl WsConnector {
    pub fn new(url: Url, reconnect_delay: Duration) -> Self {
        Self {
            url,
            reconnect_delay,
        }
    }

    /// Uses the config's socket URL and reconnect delay.
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        let url = config
            .socket_url()
            .map_err(|e| FeedError::InvalidUrl(e.to_string()))?;
        Ok(Self::new(url, config.reconnect_delay))
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl SocketConnector for WsConnector {
    fn open(&self, shutdown: CancellationToken) -> SocketChannel {
        let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(socket_task(
            self.url.clone(),
            self.reconnect_delay,
            inbound_tx,
            outbound_rx,
            shutdown,
        ));

        SocketChannel {
            inbound: inbound_rx,
            outbound: outbound_tx,
        }
    }
}

enum SessionEnd {
    /// Shutdown requested or the feed went away.
    Stop,
    Disconnected(String),
}

async fn socket_task(
    url: Url,
    reconnect_delay: Duration,
    inbound: mpsc::Sender<SocketEvent>,
    mut outbound: mpsc::Receiver<SocketEvent>,
    shutdown: CancellationToken,
) {
    let mut attempt: u64 = 0;

    loop {
        let connected = tokio::select! {
            _ = shutdown.cancelled() => return discard_pending(&mut outbound),
            result = connect_async(url.as_str()) => result,
        };

        match connected {
            Ok((stream, _response)) => {
                info!("Notification socket connected to {}", url);
                attempt = 0;
                match run_session(stream, &inbound, &mut outbound, &shutdown).await {
                    SessionEnd::Stop => {
                        info!("Notification socket closed");
                        return;
                    }
                    SessionEnd::Disconnected(reason) => {
                        warn!("Notification socket disconnected: {}", reason);
                    }
                }
            }
            Err(e) => {
                attempt += 1;
                warn!("Notification socket connect attempt {} failed: {}", attempt, e);
            }
        }

        info!(
            "Reconnecting notification socket in {}ms",
            reconnect_delay.as_millis()
        );
        tokio::select! {
            _ = shutdown.cancelled() => return discard_pending(&mut outbound),
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

/// Drains events that never reached a connection.
fn discard_pending(outbound: &mut mpsc::Receiver<SocketEvent>) {
    let mut dropped = 0;
    while outbound.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        warn!(
            "Notification socket closed before connecting, dropped {} event(s)",
            dropped
        );
    }
}

async fn run_session(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    inbound: &mpsc::Sender<SocketEvent>,
    outbound: &mut mpsc::Receiver<SocketEvent>,
    shutdown: &CancellationToken,
) -> SessionEnd {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                // Flush emits queued just before shutdown.
                while let Ok(event) = outbound.try_recv() {
                    if let Ok(payload) = event.encode() {
                        let _ = sink.send(Message::Text(payload.into())).await;
                    }
                }
                let _ = sink.send(Message::Close(None)).await;
                return SessionEnd::Stop;
            }

            event = outbound.recv() => {
                let Some(event) = event else {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Stop;
                };
                match event.encode() {
                    Ok(payload) => {
                        debug!("Socket emit: {}", payload);
                        if let Err(e) = sink.send(Message::Text(payload.into())).await {
                            return SessionEnd::Disconnected(e.to_string());
                        }
                    }
                    Err(e) => warn!("Dropping unencodable socket event: {}", e),
                }
            }

            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => match SocketEvent::decode(&text) {
                    Ok(event) => {
                        if inbound.send(event).await.is_err() {
                            let _ = sink.send(Message::Close(None)).await;
                            return SessionEnd::Stop;
                        }
                    }
                    Err(e) => warn!("Ignoring socket frame: {}", e),
                },
                Some(Ok(Message::Ping(payload))) => {
                    let _ = sink.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.as_str().to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                    return SessionEnd::Disconnected(reason);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Disconnected(e.to_string()),
                None => return SessionEnd::Disconnected("stream ended".to_string()),
            }
        }
    }
}
