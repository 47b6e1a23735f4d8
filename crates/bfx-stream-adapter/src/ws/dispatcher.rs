/*
[INPUT]:  Raw inbound text frames, in receive order
[OUTPUT]: Control events, transformed data events, or drop decisions
[POS]:    WebSocket layer - per-connection protocol state machine
[UPDATE]: When adding channel handlers or control events
*/

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::events::{ControlEvent, DataEvent, StreamError, StreamEvent, Subscribed};
use super::message::{ControlMessage, RawFrame, is_checksum, is_heartbeat};
use super::registry::{ChannelId, ChannelMeta, ChannelRegistry};
use crate::transform::{FieldMapTransformer, PayloadShape, SharedTransformer, Transformed};
use crate::types::FeedType;

const RAW_LOG_MAX_BYTES: usize = 1024;
const NULL_VALUE: &Value = &Value::Null;

/// Why a frame produced no event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Not valid JSON.
    Malformed,
    /// JSON that is neither a control object nor a channel array.
    Unrecognized,
    /// Frame offered while the connection is closed.
    NotOpen,
    /// No subscription registered for the channel id.
    UnknownChannel(ChannelId),
    Heartbeat,
    /// Registered channel whose feed has no handler.
    UnknownFeed(String),
    /// Account message without data.
    EmptyUpdate,
}

/// Outcome of dispatching one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Control(ControlEvent),
    Data(DataEvent),
    Dropped(DropReason),
}

impl Dispatch {
    pub fn into_event(self) -> Option<StreamEvent> {
        match self {
            Dispatch::Control(event) => Some(StreamEvent::Control(event)),
            Dispatch::Data(event) => Some(StreamEvent::Data(event)),
            Dispatch::Dropped(_) => None,
        }
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, Dispatch::Dropped(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
}

/// Protocol state machine for a single connection.
///
/// Owns the connection's channel registry. Frames must be fed in arrival
/// order so that a `subscribed` acknowledgement is registered before the
/// first data frame of that channel is looked up.
pub struct Dispatcher {
    state: ConnectionState,
    registry: ChannelRegistry,
    transformer: SharedTransformer,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_transformer(Arc::new(FieldMapTransformer))
    }

    pub fn with_transformer(transformer: SharedTransformer) -> Self {
        Self {
            state: ConnectionState::Closed,
            registry: ChannelRegistry::new(),
            transformer,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    /// CLOSED -> OPEN. Starts from an empty registry.
    pub fn open(&mut self) -> ControlEvent {
        self.registry.clear();
        self.state = ConnectionState::Open;
        debug!("connection open");
        ControlEvent::Open
    }

    /// Any state -> CLOSED. All subscriptions are discarded.
    pub fn close(&mut self) -> ControlEvent {
        let dropped = self.registry.len();
        self.registry.clear();
        self.state = ConnectionState::Closed;
        debug!(channels = dropped, "connection closed");
        ControlEvent::Close
    }

    /// Transport failure, forwarded verbatim.
    pub fn transport_error(&self, message: impl Into<String>) -> ControlEvent {
        ControlEvent::Error(StreamError::Transport(message.into()))
    }

    pub fn handle_text(&mut self, text: &str) -> Dispatch {
        if self.state == ConnectionState::Closed {
            debug!("frame received while closed");
            return Dispatch::Dropped(DropReason::NotOpen);
        }

        match RawFrame::parse(text) {
            Ok(frame) => self.handle_frame(frame),
            Err(err) => {
                let preview = truncate_for_log(text, RAW_LOG_MAX_BYTES);
                warn!(error = %err, bytes = text.len(), message = %preview, "ws frame is not valid json");
                Dispatch::Dropped(DropReason::Malformed)
            }
        }
    }

    pub fn handle_frame(&mut self, frame: RawFrame) -> Dispatch {
        match frame {
            RawFrame::Control(message) => self.handle_control(message),
            RawFrame::Data { chan_id, payload } => self.handle_channel(chan_id, payload),
            RawFrame::Unrecognized(value) => {
                debug!(message = %value, "ws frame unrecognized");
                Dispatch::Dropped(DropReason::Unrecognized)
            }
        }
    }

    fn handle_control(&mut self, message: ControlMessage) -> Dispatch {
        match message.event.as_str() {
            "subscribed" => {
                let (Some(chan_id), Some(channel)) = (message.chan_id, message.channel.clone())
                else {
                    return forward(message);
                };
                let symbol = message.resolved_symbol();
                let meta = ChannelMeta::new(channel.clone(), symbol.clone(), message.prec.clone());
                debug!(chan_id, channel = %channel, symbol = ?symbol, "subscription registered");
                self.registry.register(chan_id, meta);

                Dispatch::Control(ControlEvent::Subscribed(Subscribed {
                    chan_id,
                    channel,
                    symbol,
                    precision: message.prec,
                }))
            }
            "auth" if !message.is_ok() => {
                warn!(status = ?message.status, "authentication rejected");
                Dispatch::Control(ControlEvent::Error(StreamError::Auth(message.raw)))
            }
            "auth" => {
                if let Some(chan_id) = message.chan_id {
                    self.registry.register(chan_id, ChannelMeta::auth());
                }
                debug!(chan_id = ?message.chan_id, "authenticated");
                Dispatch::Control(ControlEvent::Auth(message.raw))
            }
            "unsubscribed" => {
                if let Some(chan_id) = message.chan_id {
                    let removed = self.registry.unregister(chan_id);
                    debug!(chan_id, known = removed.is_some(), "subscription removed");
                }
                forward(message)
            }
            _ => forward(message),
        }
    }

    fn handle_channel(&mut self, chan_id: ChannelId, payload: Vec<Value>) -> Dispatch {
        let Some(meta) = self.registry.lookup(chan_id) else {
            return Dispatch::Dropped(DropReason::UnknownChannel(chan_id));
        };

        if is_heartbeat(&payload) {
            debug!(chan_id, channel = %meta.channel, "heartbeat");
            return Dispatch::Dropped(DropReason::Heartbeat);
        }

        if is_checksum(&payload) {
            let Some(checksum) = payload.get(1).and_then(Value::as_i64) else {
                debug!(chan_id, "checksum frame without an integer value");
                return Dispatch::Dropped(DropReason::Unrecognized);
            };
            debug!(chan_id, checksum, "book checksum");
            return Dispatch::Data(DataEvent::Checksum {
                symbol: meta.symbol_or_empty().to_string(),
                checksum,
            });
        }

        let Some(feed) = meta.feed else {
            debug!(chan_id, channel = %meta.channel, "message in unknown channel");
            return Dispatch::Dropped(DropReason::UnknownFeed(meta.channel.clone()));
        };

        let symbol = meta.symbol_or_empty().to_string();
        let event = match feed {
            FeedType::Ticker => DataEvent::Ticker {
                data: self.transform_first(&payload, FeedType::Ticker, meta),
                symbol,
            },
            FeedType::Trades => DataEvent::Trade {
                data: self.transform_trades(payload, meta),
                symbol,
            },
            FeedType::Book | FeedType::BookRaw => DataEvent::OrderBook {
                data: self.transform_first(&payload, meta.book_feed(), meta),
                symbol,
            },
            FeedType::Candles => DataEvent::Candles {
                data: self.transform_first(&payload, FeedType::Candles, meta),
                symbol,
            },
            FeedType::Auth => match account_event(payload) {
                Some(event) => event,
                None => return Dispatch::Dropped(DropReason::EmptyUpdate),
            },
        };

        debug!(chan_id, feed = feed.as_str(), "data event");
        Dispatch::Data(event)
    }

    /// Ticker, book and candle payloads arrive wrapped as `[row]` or `[[rows]]`.
    fn transform_first(&self, payload: &[Value], feed: FeedType, meta: &ChannelMeta) -> Transformed {
        let inner = payload.first().unwrap_or(NULL_VALUE);
        self.transformer
            .transform(PayloadShape::classify(inner), feed, meta.class)
    }

    /// Trade snapshots arrive as `[[row, row, ..]]`: the wrapping array is
    /// removed and the rows fan out. Updates arrive as `["te", row]`.
    fn transform_trades(&self, payload: Vec<Value>, meta: &ChannelMeta) -> Transformed {
        let body = match payload.first() {
            Some(Value::Array(_)) => payload.into_iter().next().unwrap_or(Value::Null),
            _ => Value::Array(payload),
        };
        self.transformer
            .transform(PayloadShape::classify(&body), FeedType::Trades, meta.class)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn forward(message: ControlMessage) -> Dispatch {
    debug!(event = %message.event, "forwarding control event");
    Dispatch::Control(ControlEvent::Other {
        event: message.event,
        payload: message.raw,
    })
}

/// `[opcode, data]` on the account channel. Notifications (`n`) are
/// re-emitted under the nested opcode at `data[1]`.
fn account_event(payload: Vec<Value>) -> Option<DataEvent> {
    let mut items = payload.into_iter();
    let opcode = items.next()?.as_str()?.to_string();
    let data = items.next().unwrap_or(Value::Null);

    if opcode == "n" {
        let nested = data.get(1)?.as_str()?.to_string();
        return Some(DataEvent::Account { event: nested, data });
    }

    let has_data = match &data {
        Value::Array(values) => !values.is_empty(),
        Value::Null => false,
        _ => true,
    };
    has_data.then_some(DataEvent::Account { event: opcode, data })
}

pub(crate) fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
