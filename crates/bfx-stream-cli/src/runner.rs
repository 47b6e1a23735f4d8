/*
[INPUT]:  StreamConfig, optional credentials, shutdown token
[OUTPUT]: One stream connection whose events are written to the log
[POS]:    Runner layer - connects, subscribes and drains events
[UPDATE]: When adding startup commands or changing event logging
*/

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use bfx_stream_adapter::ws::commands;
use bfx_stream_adapter::{
    BfxWebSocket, ControlEvent, Credentials, DataEvent, RawTransformer, StreamEvent, WsConfig,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{StreamConfig, SubscriptionConfig, TransformMode};

pub struct StreamRunner {
    config: StreamConfig,
    ws: BfxWebSocket,
    events: mpsc::Receiver<StreamEvent>,
}

impl StreamRunner {
    pub fn new(config: StreamConfig, credentials: Option<Credentials>) -> Result<Self> {
        if config.authenticate && credentials.is_none() {
            bail!("authenticate is set but BFX_API_KEY / BFX_API_SECRET are missing");
        }

        let mut ws_config = WsConfig::default();
        if let Some(url) = &config.url {
            ws_config.url = url.clone();
        }

        let mut ws = BfxWebSocket::with_config(ws_config);
        if let Some(credentials) = credentials {
            ws = ws.with_credentials(credentials);
        }
        if config.transform == TransformMode::Raw {
            ws = ws.with_transformer(Arc::new(RawTransformer));
        }

        let events = ws.take_receiver().context("event receiver already taken")?;
        Ok(Self { config, ws, events })
    }

    /// Connect, issue the startup commands, then log events until the
    /// connection closes or `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
        self.ws.connect().await.context("connect stream")?;

        for command in startup_commands(&self.config) {
            self.ws.send(command).await.context("send startup command")?;
        }
        if self.config.authenticate {
            self.ws
                .authenticate(self.config.calc)
                .await
                .context("authenticate")?;
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("shutdown requested; closing stream");
                    self.ws.close().await;
                    break;
                }
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    let closed = matches!(event, StreamEvent::Control(ControlEvent::Close));
                    log_event(&event);
                    if closed {
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

/// `conf` first (flags apply to subsequent subscriptions), then one
/// subscribe per configured channel, in order.
pub fn startup_commands(config: &StreamConfig) -> Vec<Value> {
    let flags = config.flags.map(commands::config);
    let subscriptions = config.subscriptions.iter().map(|subscription| match subscription {
        SubscriptionConfig::Ticker { symbol } => commands::subscribe_ticker(symbol),
        SubscriptionConfig::Trades { symbol } => commands::subscribe_trades(symbol),
        SubscriptionConfig::Book { symbol, prec, len } => {
            commands::subscribe_order_book(symbol, prec, *len)
        }
        SubscriptionConfig::Candles { key } => commands::subscribe_candles(key),
    });
    flags.into_iter().chain(subscriptions).collect()
}

pub fn log_event(event: &StreamEvent) {
    match event {
        StreamEvent::Control(ControlEvent::Error(err)) => {
            warn!(error = ?err, "stream error");
        }
        StreamEvent::Control(ControlEvent::Subscribed(subscribed)) => {
            info!(
                chan_id = subscribed.chan_id,
                channel = %subscribed.channel,
                symbol = subscribed.symbol.as_deref().unwrap_or("-"),
                "subscribed"
            );
        }
        StreamEvent::Control(ControlEvent::Other { event, payload }) => {
            info!(event = %event, payload = %payload, "control event");
        }
        StreamEvent::Control(control) => {
            info!(event = event.kind().name(), detail = ?control, "control event");
        }
        StreamEvent::Data(DataEvent::Account { event, data }) => {
            info!(event = %event, data = %data, "account event");
        }
        StreamEvent::Data(DataEvent::Checksum { symbol, checksum }) => {
            info!(symbol = %symbol, checksum, "book checksum");
        }
        StreamEvent::Data(
            DataEvent::Ticker { symbol, data }
            | DataEvent::Trade { symbol, data }
            | DataEvent::OrderBook { symbol, data }
            | DataEvent::Candles { symbol, data },
        ) => {
            let data = serde_json::to_string(data).unwrap_or_default();
            info!(event = event.kind().name(), symbol = %symbol, data = %data, "data event");
        }
    }
}
