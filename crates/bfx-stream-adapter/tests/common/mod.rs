/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for bfx-stream-adapter tests

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Trading pair ticker row: BID .. LOW.
pub fn trading_ticker_row() -> Value {
    json!([7616.5, 31.89, 7617.5, 43.36, -550.8, -0.0674, 7617.1, 8314.71, 8257.8, 7500])
}

/// Funding currency ticker row: FRR .. LOW.
pub fn funding_ticker_row() -> Value {
    json!([0.0003, 0.0002, 1000, 30, 0.00025, 500, 2, 0.00001, 0.04, 0.00026, 12000, 0.0003, 0.0001])
}

/// Scripted WebSocket server. Sends `frames` once a client connects and
/// reports every text frame the client sends on the returned receiver.
/// The server closes the socket after `close_after` client messages.
pub async fn spawn_ws_server(
    frames: Vec<String>,
    close_after: usize,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut socket = accept_async(stream).await.unwrap();

        let mut received = 0;
        while received < close_after {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => {
                    let _ = seen_tx.send(text.to_string());
                    received += 1;
                }
                Some(Ok(_)) => {}
                _ => return,
            }
        }

        for frame in frames {
            if socket.send(Message::Text(frame.into())).await.is_err() {
                return;
            }
        }
        let _ = socket.close(None).await;
    });

    (format!("ws://{addr}"), seen_rx)
}
