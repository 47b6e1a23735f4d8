/*
[INPUT]:  Symbol identifiers (e.g., "tBTCUSD", "fUSD")
[OUTPUT]: Named tickers and candles from the REST API
[POS]:    Examples - public market data queries
[UPDATE]: When adding new market data endpoints
*/

use bfx_stream_adapter::*;

/// Example: Query market data (no authentication required)
///
/// REST responses go through the same field maps as stream payloads.
#[tokio::main]
async fn main() {
    println!("=== Stream Adapter Market Data Example ===\n");

    let client = match BfxRestClient::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    println!("Querying ticker for tBTCUSD...");
    match client.ticker("tBTCUSD").await {
        Ok(ticker) => match ticker.as_record().map(Ticker::from_record) {
            Some(Ok(ticker)) => println!("✓ Last price: {} (bid {} / ask {})", ticker.last_price, ticker.bid, ticker.ask),
            _ => println!("✓ Ticker: {}", ticker.into_value()),
        },
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nQuerying tickers for tBTCUSD,fUSD...");
    match client.tickers(&["tBTCUSD", "fUSD"]).await {
        Ok(rows) => {
            for row in rows {
                println!("✓ {}", row.into_value());
            }
        }
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nQuerying last 1m candle for tBTCUSD...");
    match client.candles("1m", "tBTCUSD", "last").await {
        Ok(candle) => println!("✓ Candle: {}", candle.into_value()),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\n✓ Market data example complete");
}
