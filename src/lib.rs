// MIT License
// Rust translation of the ksenia_lares Lares 4 WebSocket client
//
//! # lares-ws-bridge
//!
//! Direct WebSocket communication with Ksenia Lares 4 family alarm control
//! panels (Lares 4.0, BTicino 4200).
//!
//! This library talks JSON over the panel's local `/KseniaWsock` endpoint,
//! bypassing the Ksenia cloud and the vendor apps. Every outgoing command
//! carries a CRC-16 integrity checksum computed over its exact serialized
//! text; responses are correlated by command ID, and realtime change pushes
//! are fanned out on a broadcast channel.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lares_ws_bridge::{LaresConfig, LaresPanel, StatusKind};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LaresConfig::builder()
//!         .host("192.168.0.100")
//!         .pin("123456")
//!         .build();
//!
//!     let panel = LaresPanel::connect(config).await?;
//!
//!     let mut events = panel.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     panel.register(&[StatusKind::Zones, StatusKind::Partitions]).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     panel.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod event;
pub mod panel;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use checksum::compute_checksum;
pub use config::{LaresConfig, LaresConfigBuilder, Model};
pub use error::{LaresError, Result};
pub use event::{EventReceiver, LaresEvent};
pub use panel::LaresPanel;
pub use protocol::{
    Command, CommandFactory, Envelope, SignedCommand, StatusKind, ZoneBypass,
};
