/*
[INPUT]:  Feed type and instrument class
[OUTPUT]: Ordered field names for positional payloads
[POS]:    Transform layer - static field map registry
[UPDATE]: When the exchange changes the column order of a feed
*/

use crate::types::{FeedType, InstrumentClass};

const TICKER_TRADING: &[&str] = &[
    "BID",
    "BID_SIZE",
    "ASK",
    "ASK_SIZE",
    "DAILY_CHANGE",
    "DAILY_CHANGE_PERC",
    "LAST_PRICE",
    "VOLUME",
    "HIGH",
    "LOW",
];

const TICKER_FUNDING: &[&str] = &[
    "FRR",
    "BID",
    "BID_SIZE",
    "BID_PERIOD",
    "ASK",
    "ASK_SIZE",
    "ASK_PERIOD",
    "DAILY_CHANGE",
    "DAILY_CHANGE_PERC",
    "LAST_PRICE",
    "VOLUME",
    "HIGH",
    "LOW",
];

const TRADES_TRADING: &[&str] = &["ID", "MTS", "AMOUNT", "PRICE"];
const TRADES_FUNDING: &[&str] = &["ID", "MTS", "AMOUNT", "RATE", "PERIOD"];

const BOOK_TRADING: &[&str] = &["PRICE", "COUNT", "AMOUNT"];
const BOOK_FUNDING: &[&str] = &["RATE", "PERIOD", "COUNT", "AMOUNT"];

const BOOK_RAW_TRADING: &[&str] = &["ORD_ID", "PRICE", "AMOUNT"];
const BOOK_RAW_FUNDING: &[&str] = &["OFFER_ID", "PERIOD", "RATE", "AMOUNT"];

const CANDLES: &[&str] = &["MTS", "OPEN", "CLOSE", "HIGH", "LOW", "VOLUME"];

/// Field name used for the leading symbol column of multi-symbol REST rows.
pub const SYMBOL_FIELD: &str = "SYMBOL";

/// Look up the ordered field names for `(feed, class)`.
///
/// Returns `None` for feeds without a positional layout (the account
/// channel), which callers treat as pass-through.
pub fn field_map(feed: FeedType, class: InstrumentClass) -> Option<&'static [&'static str]> {
    use InstrumentClass::{FundingCurrency, TradingPair};

    let fields = match (feed, class) {
        (FeedType::Ticker, TradingPair) => TICKER_TRADING,
        (FeedType::Ticker, FundingCurrency) => TICKER_FUNDING,
        (FeedType::Trades, TradingPair) => TRADES_TRADING,
        (FeedType::Trades, FundingCurrency) => TRADES_FUNDING,
        (FeedType::Book, TradingPair) => BOOK_TRADING,
        (FeedType::Book, FundingCurrency) => BOOK_FUNDING,
        (FeedType::BookRaw, TradingPair) => BOOK_RAW_TRADING,
        (FeedType::BookRaw, FundingCurrency) => BOOK_RAW_FUNDING,
        (FeedType::Candles, _) => CANDLES,
        (FeedType::Auth, _) => return None,
    };

    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(FeedType::Ticker, InstrumentClass::TradingPair, 10)]
    #[case(FeedType::Ticker, InstrumentClass::FundingCurrency, 13)]
    #[case(FeedType::Trades, InstrumentClass::TradingPair, 4)]
    #[case(FeedType::Trades, InstrumentClass::FundingCurrency, 5)]
    #[case(FeedType::Book, InstrumentClass::TradingPair, 3)]
    #[case(FeedType::Book, InstrumentClass::FundingCurrency, 4)]
    #[case(FeedType::BookRaw, InstrumentClass::TradingPair, 3)]
    #[case(FeedType::BookRaw, InstrumentClass::FundingCurrency, 4)]
    #[case(FeedType::Candles, InstrumentClass::TradingPair, 6)]
    #[case(FeedType::Candles, InstrumentClass::FundingCurrency, 6)]
    fn test_field_map_lengths(
        #[case] feed: FeedType,
        #[case] class: InstrumentClass,
        #[case] expected: usize,
    ) {
        let fields = field_map(feed, class).expect("mapped feed");
        assert_eq!(fields.len(), expected);
    }

    #[test]
    fn test_funding_ticker_prefix() {
        let fields = field_map(FeedType::Ticker, InstrumentClass::FundingCurrency).unwrap();
        assert_eq!(&fields[..4], &["FRR", "BID", "BID_SIZE", "BID_PERIOD"]);
        assert_eq!(fields.last(), Some(&"LOW"));
    }

    #[test]
    fn test_auth_has_no_mapping() {
        assert!(field_map(FeedType::Auth, InstrumentClass::TradingPair).is_none());
        assert!(field_map(FeedType::Auth, InstrumentClass::FundingCurrency).is_none());
    }
}
