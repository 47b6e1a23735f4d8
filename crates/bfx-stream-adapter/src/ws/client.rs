/*
[INPUT]:  WebSocket URL, optional credentials, payload transformer
[OUTPUT]: Typed stream events via channel, outbound commands to the socket
[POS]:    WebSocket layer - transport and connection task
[UPDATE]: When adding commands or changing connection logic
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use super::commands;
use super::dispatcher::{Dispatcher, truncate_for_log};
use super::events::StreamEvent;
use super::registry::ChannelId;
use crate::auth::{Credentials, HmacSha384Signer, MonotonicNonce, NonceSource, PayloadSigner};
use crate::error::{BfxError, Result};
use crate::transform::{FieldMapTransformer, SharedTransformer};

pub const STREAM_URL: &str = "wss://api.bitfinex.com/ws/2";
const DEFAULT_CHANNEL_CAPACITY: usize = 100;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SUBSCRIPTION_LOG_LIMIT: usize = 10;
const RAW_LOG_MAX_BYTES: usize = 1024;

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Capacity of the consumer-facing event channel.
    pub event_capacity: usize,
    /// Capacity of the outbound command channel.
    pub command_capacity: usize,
    pub connect_timeout: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: STREAM_URL.to_string(),
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
            command_capacity: DEFAULT_CHANNEL_CAPACITY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Streaming client. Each `connect` gets its own dispatcher and channel
/// registry; events from all connections go to the same receiver.
pub struct BfxWebSocket {
    config: WsConfig,
    credentials: Option<Credentials>,
    signer: Arc<dyn PayloadSigner>,
    nonces: Arc<dyn NonceSource>,
    transformer: SharedTransformer,
    event_tx: mpsc::Sender<StreamEvent>,
    event_rx: Option<mpsc::Receiver<StreamEvent>>,
    outbound_tx: Arc<Mutex<Option<mpsc::Sender<WsMessage>>>>,
    subscription_logs: AtomicUsize,
}

impl BfxWebSocket {
    /// Create a new WebSocket client
    pub fn new() -> Self {
        Self::with_config(WsConfig::default())
    }

    pub fn with_config(config: WsConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.event_capacity.max(1));
        Self {
            config,
            credentials: None,
            signer: Arc::new(HmacSha384Signer),
            nonces: Arc::new(MonotonicNonce::new()),
            transformer: Arc::new(FieldMapTransformer),
            event_tx: tx,
            event_rx: Some(rx),
            outbound_tx: Arc::new(Mutex::new(None)),
            subscription_logs: AtomicUsize::new(0),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn PayloadSigner>) -> Self {
        self.signer = signer;
        self
    }

    pub fn with_nonce_source(mut self, nonces: Arc<dyn NonceSource>) -> Self {
        self.nonces = nonces;
        self
    }

    /// Replace the transformer applied to data payloads. Takes effect on the
    /// next `connect`.
    pub fn with_transformer(mut self, transformer: SharedTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Get the event receiver
    pub fn take_receiver(&mut self) -> Option<mpsc::Receiver<StreamEvent>> {
        self.event_rx.take()
    }

    pub async fn is_connected(&self) -> bool {
        self.outbound_tx.lock().await.is_some()
    }

    /// Open the socket and start the connection task.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected().await {
            return Err(already_connected());
        }

        let (ws_stream, _response) =
            tokio::time::timeout(self.config.connect_timeout, connect_async(self.config.url.as_str()))
                .await
                .map_err(|_| BfxError::Timeout {
                    duration: self.config.connect_timeout.as_secs(),
                })??;
        let (mut write, mut read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::channel(self.config.command_capacity.max(1));
        let own_sender = outbound_tx.downgrade();
        let outbound_state = self.outbound_tx.clone();

        // A concurrent connect may have won the slot during the handshake.
        {
            let mut guard = outbound_state.lock().await;
            if guard.is_some() {
                return Err(already_connected());
            }
            *guard = Some(outbound_tx);
        }

        info!(url = %self.config.url, "ws connected");

        let event_tx = self.event_tx.clone();
        let outbound_state_for_task = outbound_state.clone();
        let mut dispatcher = Dispatcher::with_transformer(self.transformer.clone());

        tokio::spawn(async move {
            let mut consumer_alive = emit(&event_tx, dispatcher.open()).await;

            while consumer_alive {
                tokio::select! {
                    outbound = outbound_rx.recv() => {
                        match outbound {
                            Some(message) => {
                                if let Err(err) = write.send(message).await {
                                    emit(&event_tx, dispatcher.transport_error(err.to_string())).await;
                                    break;
                                }
                            }
                            None => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                        }
                    }
                    incoming = read.next() => {
                        match incoming {
                            Some(Ok(WsMessage::Close(_))) => {
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                            Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => {}
                            Some(Ok(message)) => {
                                let Some(text) = message_text(message) else {
                                    continue;
                                };
                                if let Some(event) = dispatcher.handle_text(&text).into_event() {
                                    consumer_alive = emit(&event_tx, event).await;
                                }
                            }
                            Some(Err(err)) => {
                                emit(&event_tx, dispatcher.transport_error(err.to_string())).await;
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }

            // A later connect may already own the slot.
            let mut guard = outbound_state_for_task.lock().await;
            if let Some(own) = own_sender.upgrade()
                && guard.as_ref().is_some_and(|current| current.same_channel(&own))
            {
                *guard = None;
            }
            drop(guard);

            emit(&event_tx, dispatcher.close()).await;
            debug!("ws connection task finished");
        });

        Ok(())
    }

    /// Close the socket. The connection task emits `close` once done.
    pub async fn close(&self) {
        let mut guard = self.outbound_tx.lock().await;
        *guard = None;
    }

    /// Serialize and send any control object.
    pub async fn send(&self, message: Value) -> Result<()> {
        let sender = {
            let guard = self.outbound_tx.lock().await;
            guard
                .clone()
                .ok_or_else(|| BfxError::WebSocket("WebSocket not connected".to_string()))?
        };

        sender
            .send(WsMessage::Text(message.to_string().into()))
            .await
            .map_err(|_| BfxError::WebSocket("WebSocket send channel closed".to_string()))?;

        self.log_command_sent(&message);

        Ok(())
    }

    pub async fn subscribe_order_book(&self, symbol: &str, precision: &str, length: u32) -> Result<()> {
        self.send(commands::subscribe_order_book(symbol, precision, length))
            .await
    }

    pub async fn subscribe_trades(&self, symbol: &str) -> Result<()> {
        self.send(commands::subscribe_trades(symbol)).await
    }

    pub async fn subscribe_ticker(&self, symbol: &str) -> Result<()> {
        self.send(commands::subscribe_ticker(symbol)).await
    }

    pub async fn subscribe_candles(&self, key: &str) -> Result<()> {
        self.send(commands::subscribe_candles(key)).await
    }

    pub async fn unsubscribe(&self, chan_id: ChannelId) -> Result<()> {
        self.send(commands::unsubscribe(chan_id)).await
    }

    pub async fn submit_order(&self, order: Value) -> Result<()> {
        self.send(commands::submit_order(order)).await
    }

    pub async fn cancel_order(&self, order_id: u64) -> Result<()> {
        self.send(commands::cancel_order(order_id)).await
    }

    pub async fn set_config_flags(&self, flags: u64) -> Result<()> {
        self.send(commands::config(flags)).await
    }

    /// Authenticate the account channel. Fails with a configuration error,
    /// before touching the socket, when no credentials are set.
    pub async fn authenticate(&self, calc: u32) -> Result<()> {
        let message = commands::auth(
            self.credentials.as_ref(),
            self.signer.as_ref(),
            self.nonces.as_ref(),
            calc,
        )?;
        self.send(message).await
    }

    fn log_command_sent(&self, message: &Value) {
        let count = self.subscription_logs.fetch_add(1, Ordering::Relaxed);
        if count >= SUBSCRIPTION_LOG_LIMIT {
            return;
        }

        if let Some((action, channel, target)) = describe_command(message) {
            info!(
                sample_index = count + 1,
                sample_limit = SUBSCRIPTION_LOG_LIMIT,
                action,
                channel = channel.unwrap_or("-"),
                target = target.unwrap_or("-"),
                "ws command sent"
            );
            return;
        }

        let preview = truncate_for_log(&message.to_string(), RAW_LOG_MAX_BYTES);
        info!(
            sample_index = count + 1,
            sample_limit = SUBSCRIPTION_LOG_LIMIT,
            message = %preview,
            "ws command sent"
        );
    }
}

impl Default for BfxWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BfxWebSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BfxWebSocket")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Returns false once the consumer has dropped the receiver.
async fn emit(event_tx: &mpsc::Sender<StreamEvent>, event: impl Into<StreamEvent>) -> bool {
    event_tx.send(event.into()).await.is_ok()
}

fn already_connected() -> BfxError {
    BfxError::WebSocket("WebSocket already connected".to_string())
}

fn message_text(message: WsMessage) -> Option<String> {
    match message {
        WsMessage::Text(text) => Some(text.to_string()),
        WsMessage::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Some(text),
            Err(_) => {
                warn!(bytes = bytes.len(), "ws binary frame is not valid utf-8");
                None
            }
        },
        _ => None,
    }
}

/// `(event, channel, symbol-or-key)` of an outbound command. Never exposes
/// auth fields.
fn describe_command(message: &Value) -> Option<(&str, Option<&str>, Option<&str>)> {
    let action = message.get("event")?.as_str()?;
    let channel = message.get("channel").and_then(Value::as_str);
    let target = message
        .get("symbol")
        .or_else(|| message.get("key"))
        .and_then(Value::as_str);
    Some((action, channel, target))
}
