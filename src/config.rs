// MIT License
// Rust translation

/// Panel model.
///
/// The login handshake is the only wire-visible difference: BTicino-branded
/// panels expect `PAYLOAD_TYPE: "USER"` on the LOGIN command, Ksenia panels
/// expect `"UNKNOWN"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// Ksenia Lares 4.0
    Lares4,
    /// BTicino 4200 (rebranded Lares 4)
    Bticino4200,
}

impl Model {
    /// The `PAYLOAD_TYPE` value for the LOGIN command.
    pub fn login_payload_type(&self) -> &'static str {
        match self {
            Self::Lares4 => "UNKNOWN",
            Self::Bticino4200 => "USER",
        }
    }
}

/// Configuration for connecting to a Lares 4 panel.
#[derive(Debug, Clone)]
pub struct LaresConfig {
    /// Panel host (IP address or hostname, no scheme or path)
    pub host: String,
    /// Sender identifier placed in the SENDER field of every command
    pub sender: String,
    /// User PIN used for login and privileged commands
    pub pin: String,
    /// Panel model (selects the LOGIN payload type)
    pub model: Model,
    /// Whether to connect over `wss://` (default) or plain `ws://`
    pub use_tls: bool,
    /// Per-command response timeout in milliseconds (default: 10000)
    pub command_timeout_ms: u64,
    /// Reconnection delay in milliseconds (base delay for exponential backoff)
    pub reconnect_delay_ms: u64,
    /// Maximum number of connection retries on transient errors (0 = no retries)
    pub max_connect_retries: u32,
    /// Capacity of the broadcast event channel
    pub event_buffer: usize,
}

impl Default for LaresConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.100".to_string(),
            sender: "lares-ws-bridge".to_string(),
            pin: String::new(),
            model: Model::Lares4,
            use_tls: true,
            command_timeout_ms: 10000,
            reconnect_delay_ms: 10000,
            max_connect_retries: 3,
            event_buffer: 256,
        }
    }
}

impl LaresConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> LaresConfigBuilder {
        LaresConfigBuilder::default()
    }

    /// The WebSocket URL for this panel: `wss://<host>/KseniaWsock`, or
    /// `ws://` when TLS is disabled.
    pub fn ws_url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{}://{}/KseniaWsock", scheme, self.host)
    }
}

/// Builder for LaresConfig.
#[derive(Debug, Clone, Default)]
pub struct LaresConfigBuilder {
    config: LaresConfig,
}

impl LaresConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.config.sender = sender.into();
        self
    }

    pub fn pin(mut self, pin: impl Into<String>) -> Self {
        self.config.pin = pin.into();
        self
    }

    pub fn model(mut self, model: Model) -> Self {
        self.config.model = model;
        self
    }

    pub fn use_tls(mut self, use_tls: bool) -> Self {
        self.config.use_tls = use_tls;
        self
    }

    pub fn command_timeout_ms(mut self, ms: u64) -> Self {
        self.config.command_timeout_ms = ms;
        self
    }

    pub fn reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.config.reconnect_delay_ms = ms;
        self
    }

    pub fn max_connect_retries(mut self, retries: u32) -> Self {
        self.config.max_connect_retries = retries;
        self
    }

    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.config.event_buffer = capacity;
        self
    }

    pub fn build(self) -> LaresConfig {
        self.config
    }
}
