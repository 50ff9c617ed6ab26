// MIT License
// Rust translation of the command/response correlation from
// ksenia_lares/lares4_api.py, reworked around per-command response channels

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error};

use crate::config::Model;
use crate::error::{LaresError, Result};
use crate::protocol::{Command, CommandFactory, Envelope};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Tracks pending commands and routes responses back to callers via oneshot
/// channels, keyed by the command ID echoed in the response envelope.
pub struct CommandEngine {
    /// Envelope factory (ID counter, PIN, login token)
    factory: Mutex<CommandFactory>,
    /// Panel model, for the LOGIN payload type
    model: Model,
    /// Map of pending command IDs to their response senders
    pending: Mutex<HashMap<u64, oneshot::Sender<Envelope>>>,
    /// WebSocket writer half
    sink: Mutex<WsSink>,
    /// Whether the transport is connected
    connected: RwLock<bool>,
    /// Per-command response timeout
    command_timeout: Duration,
}

impl CommandEngine {
    pub fn new(
        factory: CommandFactory,
        model: Model,
        sink: WsSink,
        command_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            factory: Mutex::new(factory),
            model,
            pending: Mutex::new(HashMap::new()),
            sink: Mutex::new(sink),
            connected: RwLock::new(true),
            command_timeout,
        })
    }

    /// Set connected state.
    pub async fn set_connected(&self, connected: bool) {
        *self.connected.write().await = connected;
    }

    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    /// Store the session token from a successful login response.
    pub async fn set_login_token(&self, token: impl Into<String>) {
        self.factory.lock().await.set_login_token(token);
    }

    /// Build, sign, send, and wait for the correlated response.
    pub async fn send_command(&self, command: &Command) -> Result<Envelope> {
        if !*self.connected.read().await {
            return Err(LaresError::Disconnected);
        }

        // Build under the factory lock so command IDs stay strictly
        // increasing in send order.
        let signed = {
            let mut factory = self.factory.lock().await;
            factory.build_command(command, self.model)?
        };

        debug!(id = signed.id, cmd = command.name(), "sending command");

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(signed.id, tx);

        // The signed text goes out verbatim; re-serializing would break
        // the checksum.
        let send_result = {
            let mut sink = self.sink.lock().await;
            sink.send(Message::Text(signed.text.clone())).await
        };
        if let Err(e) = send_result {
            self.pending.lock().await.remove(&signed.id);
            error!("Failed to send command: {}", e);
            return Err(LaresError::WebSocket(e));
        }

        match timeout(self.command_timeout, rx).await {
            Ok(Ok(envelope)) => {
                debug!(id = signed.id, cmd = %envelope.cmd, "received response");
                Ok(envelope)
            }
            Ok(Err(_)) => {
                // Sender dropped: reader task ended while we were waiting
                self.pending.lock().await.remove(&signed.id);
                Err(LaresError::ChannelClosed)
            }
            Err(_) => {
                self.pending.lock().await.remove(&signed.id);
                debug!(id = signed.id, cmd = command.name(), "command timeout");
                Err(LaresError::CommandTimeout {
                    command: command.name().to_string(),
                })
            }
        }
    }

    /// Route a response envelope to the caller waiting on its ID.
    ///
    /// Returns the envelope back when no command is pending under that ID,
    /// so the reader can treat it as an unsolicited frame.
    pub async fn complete(&self, id: u64, envelope: Envelope) -> Option<Envelope> {
        match self.pending.lock().await.remove(&id) {
            Some(tx) => {
                // The waiter may have timed out between removal and send.
                if let Err(envelope) = tx.send(envelope) {
                    debug!(id, "response arrived after caller gave up");
                    return Some(envelope);
                }
                None
            }
            None => Some(envelope),
        }
    }

    /// Drop every pending waiter. Each dropped sender surfaces as
    /// `ChannelClosed` on the caller side.
    pub async fn fail_all_pending(&self) {
        let mut pending = self.pending.lock().await;
        if !pending.is_empty() {
            debug!(count = pending.len(), "dropping pending commands");
        }
        pending.clear();
    }

    /// Close the WebSocket writer.
    pub async fn close(&self) -> Result<()> {
        self.set_connected(false).await;
        let mut sink = self.sink.lock().await;
        sink.send(Message::Close(None)).await?;
        sink.close().await?;
        Ok(())
    }
}
