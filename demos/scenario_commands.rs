//! Example: List scenarios, execute one, and bypass a zone.

use lares_ws_bridge::{LaresConfig, LaresPanel, ZoneBypass};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = LaresConfig::builder()
        .host("192.168.0.100")
        .pin("123456")
        .build();

    let panel = LaresPanel::connect(config).await?;

    // Show the configured scenarios
    let scenarios = panel.scenarios().await?;
    println!("Scenarios:\n{}", serde_json::to_string_pretty(&scenarios)?);

    // Execute scenario 0
    println!("\nExecuting scenario 0...");
    match panel.activate_scenario(0).await {
        Ok(true) => println!("Scenario 0 executed"),
        Ok(false) => println!("Scenario 0 not acknowledged"),
        Err(e) => println!("Error executing scenario 0: {}", e),
    }

    // Bypass zone 1, wait, then restore it
    println!("\nBypassing zone 1...");
    match panel.bypass_zone(1, ZoneBypass::On).await {
        Ok(true) => println!("Zone 1 bypassed"),
        Ok(false) => println!("Zone 1 bypass not acknowledged"),
        Err(e) => println!("Error bypassing zone 1: {}", e),
    }

    tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

    println!("\nRestoring zone 1...");
    match panel.bypass_zone(1, ZoneBypass::Off).await {
        Ok(true) => println!("Zone 1 restored"),
        Ok(false) => println!("Zone 1 restore not acknowledged"),
        Err(e) => println!("Error restoring zone 1: {}", e),
    }

    panel.disconnect().await?;
    Ok(())
}
