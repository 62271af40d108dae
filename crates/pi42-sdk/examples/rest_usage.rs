/*
[INPUT]:  PI42_API_KEY / PI42_API_SECRET (optional), RUST_LOG
[OUTPUT]: Market data and, with credentials, account queries
[POS]:    Examples - REST usage
[UPDATE]: When adding new REST facades
*/

use pi42_sdk::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Pi42 REST Example ===\n");

    let public = match Pi42Client::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    let pair = "BTCINR";

    println!("Querying 24h ticker for {}...", pair);
    match public.ticker_24hr(pair).await {
        Ok(ticker) => println!("✓ Ticker: {}", ticker),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nQuerying depth for {}...", pair);
    match public.depth(pair).await {
        Ok(depth) => println!("✓ Depth: {}", depth),
        Err(e) => println!("✗ Error: {}", e),
    }

    let mut klines = KlineQuery::new(pair, "1h");
    klines.limit = Some(5);
    println!("\nQuerying klines for {}...", pair);
    match public.klines(&klines).await {
        Ok(candles) => println!("✓ Klines: {}", candles),
        Err(e) => println!("✗ Error: {}", e),
    }

    let client = match Pi42Client::from_env() {
        Ok(c) => c,
        Err(e) => {
            println!("\nSkipping account queries: {}", e);
            return;
        }
    };

    println!("\nQuerying futures wallet...");
    match client.futures_wallet_details(Some("INR")).await {
        Ok(wallet) => println!("✓ Wallet: {}", wallet),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nQuerying open orders...");
    let query = HistoryQuery::new().symbol(pair).page_size(10);
    match client.open_orders(&query).await {
        Ok(orders) => println!("✓ Open orders: {}", orders),
        Err(Pi42Error::Api { status, message, code }) => {
            println!("✗ Rejected ({}, {:?}): {}", status, code, message)
        }
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\n✓ REST example complete");
}
