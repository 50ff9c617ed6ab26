// MIT License
// Rust translation of the WebSocket session handling from
// ksenia_lares/lares4_api.py

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::time::Duration;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::config::LaresConfig;
use crate::error::{LaresError, Result};
use crate::event::{EventSender, LaresEvent};
use crate::protocol::{CommandFactory, Envelope, StatusKind};
use crate::transport::command::CommandEngine;

/// The WebSocket subprotocol the panel requires.
const SUBPROTOCOL: &str = "KS_WSOCK";

/// WebSocket transport — a single connection to the panel's `/KseniaWsock`
/// endpoint, split into a writer (owned by the [`CommandEngine`]) and a
/// spawned reader task that routes inbound frames.
pub struct WsTransport {
    pub command_engine: Arc<CommandEngine>,
    event_tx: EventSender,
    reader_handle: Option<tokio::task::JoinHandle<()>>,
}

impl WsTransport {
    /// Open the WebSocket connection and start the reader task.
    ///
    /// The panel ships a self-signed certificate, so the TLS connector
    /// skips certificate and hostname verification, matching what the
    /// official apps do on the local network.
    pub async fn connect(config: &LaresConfig, event_tx: EventSender) -> Result<Self> {
        let url = config.ws_url();
        info!("Connecting to panel at {}", url);

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(LaresError::WebSocket)?;
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static(SUBPROTOCOL),
        );

        let connector = if config.use_tls {
            let tls = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()?;
            Some(Connector::NativeTls(tls))
        } else {
            None
        };

        let (stream, response) =
            connect_async_tls_with_config(request, None, false, connector)
                .await
                .map_err(|e| {
                    error!("WebSocket connect failed: {}", e);
                    LaresError::WebSocket(e)
                })?;

        debug!(status = %response.status(), "WebSocket handshake complete");

        let (sink, stream) = stream.split();
        let factory = CommandFactory::new(config.sender.clone(), config.pin.clone());
        let command_engine = CommandEngine::new(
            factory,
            config.model,
            sink,
            Duration::from_millis(config.command_timeout_ms),
        );

        let reader_handle = spawn_reader_task(stream, command_engine.clone(), event_tx.clone());

        let _ = event_tx.send(LaresEvent::Connected);

        Ok(Self {
            command_engine,
            event_tx,
            reader_handle: Some(reader_handle),
        })
    }

    /// Get the command engine.
    pub fn engine(&self) -> &Arc<CommandEngine> {
        &self.command_engine
    }

    /// Close the connection.
    pub async fn disconnect(&self) -> Result<()> {
        info!("Disconnecting from panel");
        let _ = self.event_tx.send(LaresEvent::Disconnected);
        self.command_engine.fail_all_pending().await;
        self.command_engine.close().await
    }

    /// Whether the transport is connected.
    pub async fn is_connected(&self) -> bool {
        self.command_engine.is_connected().await
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        if let Some(handle) = self.reader_handle.take() {
            handle.abort();
        }
    }
}

/// Spawn the reader task that processes incoming frames from the panel.
fn spawn_reader_task(
    mut stream: futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    engine: Arc<CommandEngine>,
    event_tx: EventSender,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    process_frame(&text, &engine, &event_tx).await;
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    // tungstenite answers pings on the sink automatically
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Reader: close frame from panel");
                    break;
                }
                Some(Ok(other)) => {
                    warn!("Reader: unexpected frame type: {:?}", other);
                }
                Some(Err(e)) => {
                    error!("Reader: WebSocket error: {}", e);
                    break;
                }
                None => {
                    debug!("Reader: stream ended");
                    break;
                }
            }
        }
        engine.set_connected(false).await;
        engine.fail_all_pending().await;
        let _ = event_tx.send(LaresEvent::Disconnected);
    })
}

/// Process a single inbound JSON frame: responses are routed to the waiter
/// holding the echoed ID; realtime `CHANGES` pushes and anything else
/// unsolicited are fanned out on the event channel.
async fn process_frame(text: &str, engine: &Arc<CommandEngine>, event_tx: &EventSender) {
    let envelope: Envelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Reader: unparseable frame ({}): {}", e, text);
            return;
        }
    };

    if envelope.payload_type == "CHANGES" {
        dispatch_push(envelope, event_tx);
        return;
    }

    match envelope.id.parse::<u64>() {
        Ok(id) => {
            if let Some(unmatched) = engine.complete(id, envelope).await {
                // No waiter for this ID: the panel pushed it
                dispatch_push(unmatched, event_tx);
            }
        }
        Err(_) => {
            debug!(id = %envelope.id, cmd = %envelope.cmd, "frame with non-numeric ID");
            dispatch_push(envelope, event_tx);
        }
    }
}

/// Fan an unsolicited envelope out to subscribers: one `Change` event per
/// recognized status section in the payload, or `Unmatched` when the
/// payload carries no known section.
fn dispatch_push(envelope: Envelope, event_tx: &EventSender) {
    let mut matched = false;
    for (key, items) in &envelope.payload {
        if let Some(kind) = StatusKind::from_tag(key) {
            matched = true;
            debug!(?kind, "realtime change");
            let _ = event_tx.send(LaresEvent::Change {
                kind,
                items: items.clone(),
            });
        }
    }
    if !matched {
        debug!(cmd = %envelope.cmd, "unmatched frame");
        let _ = event_tx.send(LaresEvent::Unmatched(envelope));
    }
}
