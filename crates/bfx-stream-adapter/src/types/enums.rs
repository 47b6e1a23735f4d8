/*
[INPUT]:  Channel names and instrument symbols from the wire
[OUTPUT]: Typed feed and instrument-class enums
[POS]:    Data layer - protocol discriminants shared by all modules
[UPDATE]: When the exchange adds a channel kind or symbol class
*/

use serde::{Deserialize, Serialize};

/// Precision value that selects raw (unaggregated) order book semantics.
pub const RAW_BOOK_PRECISION: &str = "R0";

/// Kind of data carried by a subscribed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedType {
    #[serde(rename = "ticker")]
    Ticker,
    #[serde(rename = "trades")]
    Trades,
    #[serde(rename = "book")]
    Book,
    #[serde(rename = "bookRaw")]
    BookRaw,
    #[serde(rename = "candles")]
    Candles,
    #[serde(rename = "auth")]
    Auth,
}

impl FeedType {
    /// Resolve the channel name used in `subscribe`/`subscribed` messages.
    ///
    /// `bookRaw` is never announced by the server; raw books arrive as
    /// `book` with precision `R0`.
    pub fn from_channel(channel: &str) -> Option<Self> {
        match channel {
            "ticker" => Some(FeedType::Ticker),
            "trades" => Some(FeedType::Trades),
            "book" => Some(FeedType::Book),
            "bookRaw" => Some(FeedType::BookRaw),
            "candles" => Some(FeedType::Candles),
            "auth" => Some(FeedType::Auth),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedType::Ticker => "ticker",
            FeedType::Trades => "trades",
            FeedType::Book => "book",
            FeedType::BookRaw => "bookRaw",
            FeedType::Candles => "candles",
            FeedType::Auth => "auth",
        }
    }
}

/// Instrument class, derived from the leading character of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstrumentClass {
    TradingPair,
    FundingCurrency,
}

impl InstrumentClass {
    /// `f` prefix marks a funding currency; everything else is a trading pair.
    pub fn from_symbol(symbol: &str) -> Self {
        if symbol.starts_with('f') {
            InstrumentClass::FundingCurrency
        } else {
            InstrumentClass::TradingPair
        }
    }
}
