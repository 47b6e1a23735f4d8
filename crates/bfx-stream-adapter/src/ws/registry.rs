/*
[INPUT]:  Subscription acknowledgements (channel id + feed metadata)
[OUTPUT]: Channel id to feed metadata lookups
[POS]:    WebSocket layer - per-connection subscription state
[UPDATE]: When subscription metadata gains new attributes
*/

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{FeedType, InstrumentClass, RAW_BOOK_PRECISION};

/// Server-assigned channel identifier.
pub type ChannelId = u64;

/// Metadata for one active subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelMeta {
    /// Channel name as announced by the server.
    pub channel: String,
    /// `None` when the server announced a channel this client has no handler for.
    pub feed: Option<FeedType>,
    pub symbol: Option<String>,
    pub precision: Option<String>,
    pub class: InstrumentClass,
}

impl ChannelMeta {
    pub fn new(channel: impl Into<String>, symbol: Option<String>, precision: Option<String>) -> Self {
        let channel = channel.into();
        let class = InstrumentClass::from_symbol(symbol.as_deref().unwrap_or_default());
        Self {
            feed: FeedType::from_channel(&channel),
            channel,
            symbol,
            precision,
            class,
        }
    }

    /// Metadata for the authenticated account channel.
    pub fn auth() -> Self {
        Self::new(FeedType::Auth.as_str(), None, None)
    }

    /// Book channels split into aggregated and raw layouts by precision.
    pub fn book_feed(&self) -> FeedType {
        if self.precision.as_deref() == Some(RAW_BOOK_PRECISION) {
            FeedType::BookRaw
        } else {
            FeedType::Book
        }
    }

    pub fn symbol_or_empty(&self) -> &str {
        self.symbol.as_deref().unwrap_or_default()
    }
}

/// Active subscriptions of a single connection.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: HashMap<ChannelId, ChannelMeta>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the record previously held for `id`.
    pub fn register(&mut self, id: ChannelId, meta: ChannelMeta) -> Option<ChannelMeta> {
        self.channels.insert(id, meta)
    }

    pub fn lookup(&self, id: ChannelId) -> Option<&ChannelMeta> {
        self.channels.get(&id)
    }

    pub fn unregister(&mut self, id: ChannelId) -> Option<ChannelMeta> {
        self.channels.remove(&id)
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &ChannelMeta)> {
        self.channels.iter().map(|(id, meta)| (*id, meta))
    }
}
