// MIT License
// Rust translation of the Lares4 client surface from ksenia_lares/lares4_api.py

use serde_json::{Map, Value};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::config::LaresConfig;
use crate::error::{LaresError, Result};
use crate::event::{event_channel, EventReceiver, EventSender, LaresEvent};
use crate::protocol::{Command, Envelope, StatusKind, ZoneBypass};
use crate::transport::ws::WsTransport;

/// The main public API for interacting with a Lares 4 alarm panel.
///
/// # Example
///
/// ```no_run
/// use lares_ws_bridge::{LaresConfig, LaresPanel, StatusKind};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = LaresConfig::builder()
///         .host("192.168.0.100")
///         .pin("123456")
///         .build();
///
///     let panel = LaresPanel::connect(config).await?;
///
///     // Subscribe to realtime events
///     let mut events = panel.subscribe();
///     tokio::spawn(async move {
///         while let Ok(event) = events.recv().await {
///             println!("Event: {:?}", event);
///         }
///     });
///
///     let zones = panel.zones().await?;
///     println!("zones: {zones}");
///
///     panel.register(&[StatusKind::Zones, StatusKind::Partitions]).await?;
///
///     tokio::signal::ctrl_c().await?;
///     panel.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct LaresPanel {
    transport: WsTransport,
    event_tx: EventSender,
    config: LaresConfig,
}

impl LaresPanel {
    /// Connect to a panel with the given configuration and log in.
    ///
    /// Retries on transient errors (disconnects, timeouts, I/O errors) with
    /// exponential backoff. The base delay is `reconnect_delay_ms` from the
    /// config and the maximum number of retries is `max_connect_retries`.
    /// Login failures are not retried.
    pub async fn connect(config: LaresConfig) -> Result<Self> {
        let max_retries = config.max_connect_retries;
        let base_delay_ms = config.reconnect_delay_ms;

        let mut last_error = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay_ms = base_delay_ms * (1 << (attempt - 1).min(4));
                warn!(
                    "Connection attempt {} failed, retrying in {:.1}s...",
                    attempt,
                    delay_ms as f64 / 1000.0
                );
                sleep(Duration::from_millis(delay_ms)).await;
            }

            match Self::try_connect(config.clone()).await {
                Ok(panel) => return Ok(panel),
                Err(e) => {
                    if !e.is_retryable() || attempt == max_retries {
                        return Err(e);
                    }
                    warn!("Connection error (attempt {}): {}", attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(LaresError::Disconnected))
    }

    /// Single connection attempt without retries.
    async fn try_connect(config: LaresConfig) -> Result<Self> {
        let (event_tx, _event_rx) = event_channel(config.event_buffer);
        let transport = WsTransport::connect(&config, event_tx.clone()).await?;

        let panel = Self {
            transport,
            event_tx,
            config,
        };
        panel.login().await?;

        info!("Panel session established");
        Ok(panel)
    }

    /// Perform the LOGIN handshake and store the session token.
    async fn login(&self) -> Result<()> {
        debug!("Sending LOGIN");
        let response = self.transport.engine().send_command(&Command::Login).await?;

        if response.cmd != "LOGIN_RES" {
            return Err(LaresError::InvalidResponse {
                details: format!("expected LOGIN_RES, got {}", response.cmd),
            });
        }

        // ID_LOGIN arrives as a string on some firmware and a number on
        // others.
        let token = match response.payload.get("ID_LOGIN") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(LaresError::LoginFailed {
                    details: response
                        .result()
                        .unwrap_or("no ID_LOGIN in LOGIN_RES")
                        .to_string(),
                })
            }
        };

        self.transport.engine().set_login_token(token).await;
        let _ = self.event_tx.send(LaresEvent::LoggedIn);
        debug!("Login complete");
        Ok(())
    }

    /// Subscribe to panel events.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    /// The active configuration.
    pub fn config(&self) -> &LaresConfig {
        &self.config
    }

    /// Whether the underlying connection is up.
    pub async fn is_connected(&self) -> bool {
        self.transport.is_connected().await
    }

    /// One-shot status read. Returns the raw response payload, one JSON
    /// section per requested kind under its wire tag.
    pub async fn read(&self, kinds: &[StatusKind]) -> Result<Map<String, Value>> {
        let response = self
            .transport
            .engine()
            .send_command(&Command::Read {
                kinds: kinds.to_vec(),
            })
            .await?;
        Ok(response.payload)
    }

    /// Read a single status section.
    async fn read_section(&self, kind: StatusKind) -> Result<Value> {
        let mut payload = self.read(&[kind]).await?;
        payload.remove(kind.tag()).ok_or_else(|| LaresError::InvalidResponse {
            details: format!("response payload has no {} section", kind.tag()),
        })
    }

    /// The panel's zones, as raw JSON.
    pub async fn zones(&self) -> Result<Value> {
        self.read_section(StatusKind::Zones).await
    }

    /// The panel's partitions, as raw JSON.
    pub async fn partitions(&self) -> Result<Value> {
        self.read_section(StatusKind::Partitions).await
    }

    /// The configured scenarios, as raw JSON.
    pub async fn scenarios(&self) -> Result<Value> {
        self.read_section(StatusKind::Scenarios).await
    }

    /// The panel's outputs, as raw JSON.
    pub async fn outputs(&self) -> Result<Value> {
        self.read_section(StatusKind::Outputs).await
    }

    /// Bus peripherals (DOMUS sensors and similar), as raw JSON.
    pub async fn peripherals(&self) -> Result<Value> {
        self.read_section(StatusKind::Peripherals).await
    }

    /// Temperature readings, as raw JSON.
    pub async fn temperatures(&self) -> Result<Value> {
        self.read_section(StatusKind::Temperatures).await
    }

    /// Overall system status, as raw JSON.
    pub async fn system_status(&self) -> Result<Value> {
        self.read_section(StatusKind::System).await
    }

    /// Register for realtime change pushes on the given kinds. After this,
    /// subscribers receive a `LaresEvent::Change` per changed section.
    pub async fn register(&self, kinds: &[StatusKind]) -> Result<()> {
        let response = self
            .transport
            .engine()
            .send_command(&Command::Register {
                kinds: kinds.to_vec(),
            })
            .await?;
        debug!(cmd = %response.cmd, "realtime registration acknowledged");
        Ok(())
    }

    /// Execute a scenario (arm, disarm, automation). Returns whether the
    /// panel reported `RESULT: "OK"`.
    pub async fn activate_scenario(&self, id: u32) -> Result<bool> {
        let response = self
            .transport
            .engine()
            .send_command(&Command::ExecuteScenario { id })
            .await?;
        Ok(response.is_ok_result())
    }

    /// Set or clear a zone bypass. Returns whether the panel reported
    /// `RESULT: "OK"`.
    pub async fn bypass_zone(&self, id: u32, bypass: ZoneBypass) -> Result<bool> {
        let response = self
            .transport
            .engine()
            .send_command(&Command::BypassZone { id, bypass })
            .await?;
        Ok(response.is_ok_result())
    }

    /// Send LOGOUT and wait for the acknowledgement.
    pub async fn logout(&self) -> Result<Envelope> {
        self.transport.engine().send_command(&Command::Logout).await
    }

    /// Log out (best effort) and close the connection.
    pub async fn disconnect(&self) -> Result<()> {
        if self.transport.is_connected().await {
            if let Err(e) = self.logout().await {
                debug!("Logout before disconnect failed: {}", e);
            }
        }
        self.transport.disconnect().await
    }
}
