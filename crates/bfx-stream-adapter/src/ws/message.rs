/*
[INPUT]:  Raw WebSocket text frames
[OUTPUT]: Parsed control messages and channel data frames
[POS]:    WebSocket layer - frame parsing and classification
[UPDATE]: When adding new control fields or changing frame format
*/

use serde_json::Value;

use super::registry::ChannelId;

/// Keep-alive marker sent on every channel.
pub const HEARTBEAT: &str = "hb";
/// Book checksum opcode, sent when the `CHECKSUM` conf flag is set.
pub const CHECKSUM: &str = "cs";

/// Control-plane object (anything carrying a string `event` attribute).
///
/// Optional attributes with an unexpected type read as `None`; the object
/// itself is always kept in `raw`.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMessage {
    pub event: String,
    pub channel: Option<String>,
    pub chan_id: Option<ChannelId>,
    pub symbol: Option<String>,
    pub prec: Option<String>,
    pub key: Option<String>,
    pub status: Option<String>,
    /// Full object as received, forwarded to consumers untouched.
    pub raw: Value,
}

impl ControlMessage {
    /// Gives the value back unless it has a string `event`.
    pub fn from_value(value: Value) -> Result<Self, Value> {
        let Some(event) = value.get("event").and_then(Value::as_str) else {
            return Err(value);
        };
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        let event = event.to_string();
        let channel = text("channel");
        let symbol = text("symbol");
        let prec = text("prec");
        let key = text("key");
        let status = text("status");
        let chan_id = value.get("chanId").and_then(Value::as_u64);

        Ok(Self {
            event,
            channel,
            chan_id,
            symbol,
            prec,
            key,
            status,
            raw: value,
        })
    }

    /// Symbol of the subscription. Candle acknowledgements carry only a key
    /// of the form `trade:1m:tBTCUSD`.
    pub fn resolved_symbol(&self) -> Option<String> {
        self.symbol.clone().or_else(|| {
            self.key
                .as_deref()
                .and_then(|key| key.split(':').nth(2))
                .map(str::to_string)
        })
    }

    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("OK")
    }
}

/// One inbound frame after JSON parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFrame {
    Control(ControlMessage),
    Data {
        chan_id: ChannelId,
        payload: Vec<Value>,
    },
    /// Valid JSON that is neither a control object nor a channel array.
    Unrecognized(Value),
}

impl RawFrame {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        let value = match ControlMessage::from_value(value) {
            Ok(message) => return RawFrame::Control(message),
            Err(value) => value,
        };

        match value {
            Value::Array(mut items) => match items.first().and_then(Value::as_u64) {
                Some(chan_id) => {
                    items.remove(0);
                    RawFrame::Data {
                        chan_id,
                        payload: items,
                    }
                }
                None => RawFrame::Unrecognized(Value::Array(items)),
            },
            other => RawFrame::Unrecognized(other),
        }
    }
}

/// `[chanId, "hb"]` once the channel id has been removed.
pub fn is_heartbeat(payload: &[Value]) -> bool {
    payload.first().and_then(Value::as_str) == Some(HEARTBEAT)
}

/// `[chanId, "cs", checksum]` once the channel id has been removed.
pub fn is_checksum(payload: &[Value]) -> bool {
    payload.first().and_then(Value::as_str) == Some(CHECKSUM)
}
