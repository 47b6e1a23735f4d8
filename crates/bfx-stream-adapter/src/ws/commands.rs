/*
[INPUT]:  Subscription parameters, order payloads, credentials
[OUTPUT]: Outbound control objects ready for the transport
[POS]:    WebSocket layer - pure builders for outbound commands
[UPDATE]: When adding commands or changing their wire format
*/

use serde_json::{Value, json};

use super::registry::ChannelId;
use crate::auth::{Credentials, NonceSource, PayloadSigner};
use crate::error::{BfxError, Result};

pub const DEFAULT_SYMBOL: &str = "tBTCUSD";
pub const DEFAULT_PRECISION: &str = "P0";
pub const DEFAULT_BOOK_LENGTH: u32 = 25;

/// Flags accepted by the `conf` command; combine with `|`.
pub mod flags {
    /// Decimal numbers as strings.
    pub const DEC_S: u64 = 8;
    /// Times as date strings.
    pub const TIME_S: u64 = 32;
    /// Timestamp appended to every data frame.
    pub const TIMESTAMP: u64 = 32768;
    /// Sequence numbers appended to every frame.
    pub const SEQ_ALL: u64 = 65536;
    /// Checksum frames after every book update.
    pub const CHECKSUM: u64 = 131072;
}

pub fn subscribe_order_book(symbol: &str, precision: &str, length: u32) -> Value {
    json!({
        "event": "subscribe",
        "channel": "book",
        "symbol": symbol,
        "len": length.to_string(),
        "prec": precision,
    })
}

pub fn subscribe_trades(symbol: &str) -> Value {
    json!({
        "event": "subscribe",
        "channel": "trades",
        "symbol": symbol,
    })
}

pub fn subscribe_ticker(symbol: &str) -> Value {
    json!({
        "event": "subscribe",
        "channel": "ticker",
        "symbol": symbol,
    })
}

/// `key` has the form `trade:<timeframe>:<symbol>`, e.g. `trade:1m:tBTCUSD`.
pub fn subscribe_candles(key: &str) -> Value {
    json!({
        "event": "subscribe",
        "channel": "candles",
        "key": key,
    })
}

pub fn unsubscribe(chan_id: ChannelId) -> Value {
    json!({
        "event": "unsubscribe",
        "chanId": chan_id,
    })
}

/// Orders are sent exactly as given.
pub fn submit_order(order: Value) -> Value {
    order
}

pub fn cancel_order(order_id: u64) -> Value {
    json!([0, "oc", null, { "id": order_id }])
}

pub fn config(flags: u64) -> Value {
    json!({
        "event": "conf",
        "flags": flags,
    })
}

/// Build the `auth` command.
///
/// The signed payload is `AUTH<nonce><nonce>`. Fails before anything is
/// signed when no credentials are configured.
pub fn auth(
    credentials: Option<&Credentials>,
    signer: &dyn PayloadSigner,
    nonces: &dyn NonceSource,
    calc: u32,
) -> Result<Value> {
    let credentials = credentials
        .ok_or_else(|| BfxError::Config("API key and secret are required to authenticate".to_string()))?;
    if credentials.api_key().is_empty() || credentials.api_secret().is_empty() {
        return Err(BfxError::Config("API key and secret must not be empty".to_string()));
    }

    let nonce = nonces.next_nonce();
    let payload = format!("AUTH{nonce}{nonce}");
    let signature = signer.sign(credentials.api_secret(), &payload);

    Ok(json!({
        "event": "auth",
        "apiKey": credentials.api_key(),
        "authSig": signature,
        "authPayload": payload,
        "authNonce": nonce + 1,
        "calc": calc,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{FixedNonce, HmacSha384Signer, MockPayloadSigner};

    #[test]
    fn test_subscribe_order_book() {
        let message = subscribe_order_book("tETHUSD", "R0", 100);
        assert_eq!(
            message,
            json!({"event": "subscribe", "channel": "book", "symbol": "tETHUSD", "len": "100", "prec": "R0"})
        );
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        assert_eq!(
            subscribe_ticker(DEFAULT_SYMBOL),
            json!({"event": "subscribe", "channel": "ticker", "symbol": "tBTCUSD"})
        );
        assert_eq!(
            subscribe_trades("fUSD"),
            json!({"event": "subscribe", "channel": "trades", "symbol": "fUSD"})
        );
        assert_eq!(
            subscribe_candles("trade:1m:tBTCUSD"),
            json!({"event": "subscribe", "channel": "candles", "key": "trade:1m:tBTCUSD"})
        );
        assert_eq!(unsubscribe(22), json!({"event": "unsubscribe", "chanId": 22}));
    }

    #[test]
    fn test_order_commands() {
        let order = json!([0, "on", null, {"type": "EXCHANGE LIMIT", "symbol": "tBTCUSD", "amount": "0.1", "price": "7000"}]);
        assert_eq!(submit_order(order.clone()), order);
        assert_eq!(cancel_order(1185815098), json!([0, "oc", null, {"id": 1185815098}]));
    }

    #[test]
    fn test_config_flags() {
        assert_eq!(
            config(flags::TIMESTAMP | flags::SEQ_ALL),
            json!({"event": "conf", "flags": 98304})
        );
    }

    #[test]
    fn test_auth_message() {
        let credentials = Credentials::new("api-key", "secret");

        let message = auth(
            Some(&credentials),
            &HmacSha384Signer,
            &FixedNonce(1_500_000_000_000_000),
            0,
        )
        .unwrap();

        assert_eq!(message["event"], json!("auth"));
        assert_eq!(message["apiKey"], json!("api-key"));
        assert_eq!(message["authPayload"], json!("AUTH15000000000000001500000000000000"));
        assert_eq!(message["authNonce"], json!(1_500_000_000_000_001_u64));
        assert_eq!(
            message["authSig"],
            json!("6e69a2d8a4556bc5ce5f0f4f08d415f274948369fd81486afc6d59f4a9685c56bf7dae9d30c46f1829a03501aa06644e")
        );
        assert_eq!(message["calc"], json!(0));
    }

    #[test]
    fn test_auth_without_credentials_fails_fast() {
        let signer = MockPayloadSigner::new("unused");

        let err = auth(None, &signer, &FixedNonce(1), 0).unwrap_err();

        assert!(matches!(err, BfxError::Config(_)));
    }
}
