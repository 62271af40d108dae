/*
[INPUT]:  PI42_API_KEY / PI42_API_SECRET (optional), RUST_LOG
[OUTPUT]: Live ticker/depth events and, with credentials, account events
[POS]:    Examples - stream usage
[UPDATE]: When stream subscription or handler registration changes
*/

use std::sync::Arc;
use std::time::Duration;

use pi42_sdk::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Pi42 Stream Example ===\n");

    let mut supervisor = StreamSupervisor::default();
    if let Ok(client) = Pi42Client::from_env() {
        supervisor = supervisor.with_listen_key_provider(Arc::new(client));
    }

    supervisor.on(EventType::Ticker24hr, |payload| println!("ticker: {}", payload));
    supervisor.on(EventType::DepthUpdate, |payload| println!("depth: {}", payload));
    supervisor.on(EventType::OrderFilled, |payload| println!("order filled: {}", payload));
    supervisor.on(EventType::BalanceUpdate, |payload| println!("balance: {}", payload));

    if let Err(e) = supervisor
        .connect_public(["btcinr@ticker", "btcinr@depth_0.1"])
        .await
    {
        eprintln!("Failed to start public stream: {}", e);
        return;
    }
    match supervisor.wait_public_connected(Duration::from_secs(10)).await {
        Ok(()) => println!("✓ Public stream connected"),
        Err(e) => println!("✗ Public stream: {}", e),
    }

    match supervisor.connect_authenticated(None).await {
        Ok(()) => match supervisor
            .wait_authenticated_connected(Duration::from_secs(10))
            .await
        {
            Ok(()) => println!("✓ Account stream connected"),
            Err(e) => println!("✗ Account stream: {}", e),
        },
        Err(e) => println!("Skipping account stream: {}", e),
    }

    println!("\nStreaming for 30s...");
    tokio::time::sleep(Duration::from_secs(30)).await;

    supervisor.close().await;
    println!("\n✓ Stream example complete");
}
