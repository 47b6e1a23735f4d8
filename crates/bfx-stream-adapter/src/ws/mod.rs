/*
[INPUT]:  WebSocket configuration, subscription commands, inbound frames
[OUTPUT]: Typed market data, account and control events
[POS]:    WebSocket layer - channel protocol and real-time streams
[UPDATE]: When adding new channels or changing connection logic
*/

pub mod client;
pub mod commands;
pub mod dispatcher;
pub mod events;
pub mod message;
pub mod registry;

pub use client::{BfxWebSocket, STREAM_URL, WsConfig};
pub use commands::flags;
pub use dispatcher::{ConnectionState, Dispatch, Dispatcher, DropReason};
pub use events::{ControlEvent, DataEvent, EventKind, EventListeners, StreamError, StreamEvent, Subscribed};
pub use message::{ControlMessage, RawFrame};
pub use registry::{ChannelId, ChannelMeta, ChannelRegistry};
