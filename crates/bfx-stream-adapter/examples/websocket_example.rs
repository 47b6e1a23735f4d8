/*
[INPUT]:  Stream URL and a symbol to watch
[OUTPUT]: Named ticker, trade and book updates printed to stdout
[POS]:    Examples - WebSocket stream handling
[UPDATE]: When WebSocket API changes
*/

use bfx_stream_adapter::*;
use tokio::time::{Duration, timeout};

/// Example: subscribe to public channels and print transformed events
///
/// Data channels deliver positional arrays; the client names every column
/// before handing events to the receiver.
#[tokio::main]
async fn main() {
    println!("=== Stream Adapter WebSocket Example ===\n");

    let mut ws = BfxWebSocket::new();
    let Some(mut receiver) = ws.take_receiver() else {
        eprintln!("Receiver already taken");
        return;
    };

    if let Err(e) = ws.connect().await {
        eprintln!("Failed to connect: {}", e);
        return;
    }
    println!("✓ Connected to {}", ws.config().url);

    let symbol = "tBTCUSD";
    for result in [
        ws.subscribe_ticker(symbol).await,
        ws.subscribe_trades(symbol).await,
        ws.subscribe_order_book(symbol, "P0", 25).await,
    ] {
        if let Err(e) = result {
            eprintln!("✗ Subscribe failed: {}", e);
        }
    }

    println!("Printing events for 10 seconds...\n");
    let _ = timeout(Duration::from_secs(10), async {
        while let Some(event) = receiver.recv().await {
            match event {
                StreamEvent::Data(DataEvent::Ticker { symbol, data }) => {
                    println!("ticker {}: {}", symbol, data.into_value());
                }
                StreamEvent::Data(DataEvent::Trade { symbol, data }) => {
                    println!("trade {}: {}", symbol, data.into_value());
                }
                StreamEvent::Data(DataEvent::OrderBook { symbol, data }) => {
                    println!("book {}: {}", symbol, data.into_value());
                }
                other => println!("{}: {:?}", other.kind().name(), other),
            }
        }
    })
    .await;

    ws.close().await;
    println!("\n✓ WebSocket example complete");
}
