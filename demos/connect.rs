//! Example: Connect to a Lares 4 panel and print raw status sections.

use lares_ws_bridge::{LaresConfig, LaresPanel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = LaresConfig::builder()
        .host("192.168.0.100")
        .sender("lares-demo")
        .pin("123456")
        .build();

    println!("Connecting to panel...");
    let panel = LaresPanel::connect(config).await?;

    let zones = panel.zones().await?;
    println!("\n--- Zones ---");
    println!("{}", serde_json::to_string_pretty(&zones)?);

    let partitions = panel.partitions().await?;
    println!("\n--- Partitions ---");
    println!("{}", serde_json::to_string_pretty(&partitions)?);

    let scenarios = panel.scenarios().await?;
    println!("\n--- Scenarios ---");
    println!("{}", serde_json::to_string_pretty(&scenarios)?);

    let system = panel.system_status().await?;
    println!("\n--- System ---");
    println!("{}", serde_json::to_string_pretty(&system)?);

    panel.disconnect().await?;
    println!("Disconnected.");

    Ok(())
}
