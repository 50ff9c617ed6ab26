//! Example: Register for realtime changes and print them as they arrive.

use lares_ws_bridge::{LaresConfig, LaresEvent, LaresPanel, StatusKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = LaresConfig::builder()
        .host("192.168.0.100")
        .pin("123456")
        .build();

    let panel = LaresPanel::connect(config).await?;
    let mut events = panel.subscribe();

    panel
        .register(&[
            StatusKind::Zones,
            StatusKind::Partitions,
            StatusKind::Outputs,
            StatusKind::System,
        ])
        .await?;

    println!("Listening for changes (Ctrl+C to stop)...\n");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(LaresEvent::Change { kind, items }) => {
                        println!("{:?} changed: {}", kind, items);
                    }
                    Ok(LaresEvent::Disconnected) => {
                        println!("Panel disconnected!");
                        break;
                    }
                    Ok(event) => {
                        println!("Event: {:?}", event);
                    }
                    Err(e) => {
                        println!("Event channel error: {}", e);
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nDisconnecting...");
                break;
            }
        }
    }

    panel.disconnect().await?;
    Ok(())
}
