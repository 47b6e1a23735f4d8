/*
[INPUT]:  Dispatcher output and consumer-registered callbacks
[OUTPUT]: Typed stream events and per-kind listener fan-out
[POS]:    WebSocket layer - consumer-facing event model
[UPDATE]: When adding event kinds or listener capabilities
*/

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use super::registry::ChannelId;
use crate::transform::Transformed;

/// Error surfaced to the consumer as an `error` event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Socket-level failure, passed through verbatim.
    Transport(String),
    /// Rejected `auth` response, carrying the server's status payload.
    Auth(Value),
}

/// Subscription acknowledgement as registered in the channel registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscribed {
    pub chan_id: ChannelId,
    pub channel: String,
    pub symbol: Option<String>,
    pub precision: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    Open,
    Close,
    Error(StreamError),
    Subscribed(Subscribed),
    Auth(Value),
    /// Any other control event (`info`, `unsubscribed`, `conf`, ...),
    /// forwarded with the full control object.
    Other { event: String, payload: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataEvent {
    Ticker { symbol: String, data: Transformed },
    Trade { symbol: String, data: Transformed },
    OrderBook { symbol: String, data: Transformed },
    Candles { symbol: String, data: Transformed },
    /// Signed CRC32 of the top book levels.
    Checksum { symbol: String, checksum: i64 },
    /// Account channel message named after its opcode (`os`, `on`, `ws`, ...).
    Account { event: String, data: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Control(ControlEvent),
    Data(DataEvent),
}

/// Event names consumers can listen on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Close,
    Error,
    Subscribed,
    Auth,
    Ticker,
    Trade,
    OrderBook,
    Candles,
    Checksum,
    /// Forwarded control events and account events, by name.
    Other(String),
}

impl EventKind {
    pub fn name(&self) -> &str {
        match self {
            EventKind::Open => "open",
            EventKind::Close => "close",
            EventKind::Error => "error",
            EventKind::Subscribed => "subscribed",
            EventKind::Auth => "auth",
            EventKind::Ticker => "ticker",
            EventKind::Trade => "trade",
            EventKind::OrderBook => "orderbook",
            EventKind::Candles => "candles",
            EventKind::Checksum => "checksum",
            EventKind::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "open" => EventKind::Open,
            "close" => EventKind::Close,
            "error" => EventKind::Error,
            "subscribed" => EventKind::Subscribed,
            "auth" => EventKind::Auth,
            "ticker" => EventKind::Ticker,
            "trade" => EventKind::Trade,
            "orderbook" => EventKind::OrderBook,
            "candles" => EventKind::Candles,
            "checksum" => EventKind::Checksum,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::Control(ControlEvent::Open) => EventKind::Open,
            StreamEvent::Control(ControlEvent::Close) => EventKind::Close,
            StreamEvent::Control(ControlEvent::Error(_)) => EventKind::Error,
            StreamEvent::Control(ControlEvent::Subscribed(_)) => EventKind::Subscribed,
            StreamEvent::Control(ControlEvent::Auth(_)) => EventKind::Auth,
            StreamEvent::Control(ControlEvent::Other { event, .. }) => {
                EventKind::Other(event.clone())
            }
            StreamEvent::Data(DataEvent::Ticker { .. }) => EventKind::Ticker,
            StreamEvent::Data(DataEvent::Trade { .. }) => EventKind::Trade,
            StreamEvent::Data(DataEvent::OrderBook { .. }) => EventKind::OrderBook,
            StreamEvent::Data(DataEvent::Candles { .. }) => EventKind::Candles,
            StreamEvent::Data(DataEvent::Checksum { .. }) => EventKind::Checksum,
            StreamEvent::Data(DataEvent::Account { event, .. }) => EventKind::Other(event.clone()),
        }
    }

    /// Symbol of a market data event.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            StreamEvent::Data(
                DataEvent::Ticker { symbol, .. }
                | DataEvent::Trade { symbol, .. }
                | DataEvent::OrderBook { symbol, .. }
                | DataEvent::Candles { symbol, .. }
                | DataEvent::Checksum { symbol, .. },
            ) => Some(symbol),
            _ => None,
        }
    }
}

impl From<ControlEvent> for StreamEvent {
    fn from(event: ControlEvent) -> Self {
        StreamEvent::Control(event)
    }
}

impl From<DataEvent> for StreamEvent {
    fn from(event: DataEvent) -> Self {
        StreamEvent::Data(event)
    }
}

type Listener = Box<dyn Fn(&StreamEvent) + Send + Sync>;

/// Callbacks keyed by event kind.
#[derive(Default)]
pub struct EventListeners {
    listeners: HashMap<EventKind, Vec<Listener>>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> &mut Self
    where
        F: Fn(&StreamEvent) + Send + Sync + 'static,
    {
        self.listeners.entry(kind).or_default().push(Box::new(listener));
        self
    }

    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.listeners.get(kind).map_or(0, Vec::len)
    }

    /// Invoke every listener registered for the event's kind, in
    /// registration order. Returns how many were called.
    pub fn emit(&self, event: &StreamEvent) -> usize {
        let kind = event.kind();
        let Some(listeners) = self.listeners.get(&kind) else {
            return 0;
        };
        for listener in listeners {
            listener(event);
        }
        debug!(event = kind.name(), listeners = listeners.len(), "event emitted");
        listeners.len()
    }

    /// Drain a client's event receiver into the registered listeners.
    pub async fn run(self, mut receiver: mpsc::Receiver<StreamEvent>) {
        while let Some(event) = receiver.recv().await {
            self.emit(&event);
        }
    }
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(kind, listeners)| (kind.name(), listeners.len()))
            .collect();
        f.debug_struct("EventListeners").field("listeners", &counts).finish()
    }
}
