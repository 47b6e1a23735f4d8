/*
[INPUT]:  Named records produced by the transform pipeline
[OUTPUT]: Typed Rust structs with decimal fields
[POS]:    Data layer - typed views over transformed records
[UPDATE]: When field maps change or new typed views are needed
*/

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::transform::Record;

/// Ticker for either instrument class; funding-only fields are `None` for
/// trading pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Ticker {
    #[serde(default)]
    pub frr: Option<Decimal>,
    pub bid: Decimal,
    pub bid_size: Decimal,
    #[serde(default)]
    pub bid_period: Option<Decimal>,
    pub ask: Decimal,
    pub ask_size: Decimal,
    #[serde(default)]
    pub ask_period: Option<Decimal>,
    pub daily_change: Decimal,
    pub daily_change_perc: Decimal,
    pub last_price: Decimal,
    pub volume: Decimal,
    pub high: Decimal,
    pub low: Decimal,
}

/// Public trade; `price` for pairs, `rate`/`period` for funding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Trade {
    pub id: i64,
    pub mts: i64,
    pub amount: Decimal,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub rate: Option<Decimal>,
    #[serde(default)]
    pub period: Option<i64>,
}

/// Order book level (aggregated) or order/offer entry (raw).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BookEntry {
    #[serde(default)]
    pub ord_id: Option<i64>,
    #[serde(default)]
    pub offer_id: Option<i64>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub rate: Option<Decimal>,
    #[serde(default)]
    pub period: Option<i64>,
    #[serde(default)]
    pub count: Option<i64>,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Candle {
    pub mts: i64,
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
}

fn from_record<T: for<'de> Deserialize<'de>>(record: &Record) -> Result<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(record.clone()))?)
}

impl Ticker {
    pub fn from_record(record: &Record) -> Result<Self> {
        from_record(record)
    }
}

impl Trade {
    pub fn from_record(record: &Record) -> Result<Self> {
        from_record(record)
    }
}

impl BookEntry {
    pub fn from_record(record: &Record) -> Result<Self> {
        from_record(record)
    }

    /// Positive amount is a bid (or funding offer), negative an ask.
    pub fn is_bid(&self) -> bool {
        self.amount.is_sign_positive()
    }
}

impl Candle {
    pub fn from_record(record: &Record) -> Result<Self> {
        from_record(record)
    }
}
