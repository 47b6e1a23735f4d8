/*
[INPUT]:  Raw positional payloads, feed type, instrument class
[OUTPUT]: Named records (single, fan-out list, or opcode-wrapped)
[POS]:    Transform layer - pure payload-to-record pipeline
[UPDATE]: When payload shapes or transformer plug-ins change
*/

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::maps::{SYMBOL_FIELD, field_map};
use crate::types::{FeedType, InstrumentClass};

/// One named row.
pub type Record = serde_json::Map<String, Value>;

/// Trade stream opcodes whose second element is the actual row.
const TRADE_OPCODES: [&str; 2] = ["tu", "te"];

/// Output of a transformation.
///
/// Serializes untagged, so `Opcode` becomes `[opcode, {..}]` with the
/// opcode preserved in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Transformed {
    Record(Record),
    Records(Vec<Record>),
    Opcode(String, Record),
    Raw(Value),
}

impl Transformed {
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Transformed::Record(record) | Transformed::Opcode(_, record) => Some(record),
            _ => None,
        }
    }

    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            Transformed::Records(records) => Some(records),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Transformed::Record(record) => Value::Object(record),
            Transformed::Records(records) => {
                Value::Array(records.into_iter().map(Value::Object).collect())
            }
            Transformed::Opcode(opcode, record) => {
                Value::Array(vec![Value::String(opcode), Value::Object(record)])
            }
            Transformed::Raw(value) => value,
        }
    }
}

/// Structural classification of a payload, decided once before mapping.
///
/// A payload is a snapshot when its first element is itself an array.
/// A one-row snapshot `[[..]]` is therefore still a snapshot and fans out
/// to a single-element list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PayloadShape<'a> {
    Snapshot(&'a [Value]),
    Update(&'a [Value]),
    Opcode { opcode: &'a str, row: &'a Value },
    Opaque(&'a Value),
}

impl<'a> PayloadShape<'a> {
    pub fn classify(payload: &'a Value) -> Self {
        let Some(items) = payload.as_array() else {
            return PayloadShape::Opaque(payload);
        };

        if let (Some(Value::String(opcode)), Some(row)) = (items.first(), items.get(1))
            && TRADE_OPCODES.contains(&opcode.as_str())
        {
            return PayloadShape::Opcode {
                opcode: opcode.as_str(),
                row,
            };
        }

        match items.first() {
            Some(Value::Array(_)) => PayloadShape::Snapshot(items),
            _ => PayloadShape::Update(items),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self, PayloadShape::Snapshot(_))
    }

    /// Rebuild the payload this shape was classified from.
    pub fn to_value(&self) -> Value {
        match self {
            PayloadShape::Snapshot(items) | PayloadShape::Update(items) => {
                Value::Array(items.to_vec())
            }
            PayloadShape::Opcode { opcode, row } => {
                Value::Array(vec![Value::String((*opcode).to_string()), (*row).clone()])
            }
            PayloadShape::Opaque(value) => (*value).clone(),
        }
    }
}

/// Strict positional zip. Missing trailing values leave fields absent;
/// surplus values are dropped.
pub fn zip_fields(fields: &[&str], row: &[Value]) -> Record {
    fields
        .iter()
        .zip(row.iter())
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

fn zip_row(fields: &[&str], row: &Value) -> Record {
    row.as_array()
        .map(|values| zip_fields(fields, values))
        .unwrap_or_default()
}

/// Apply the registered field map to an already classified payload.
///
/// Feeds without a field map pass the payload through unchanged.
pub fn apply_field_map(
    shape: PayloadShape<'_>,
    feed: FeedType,
    class: InstrumentClass,
) -> Transformed {
    let Some(fields) = field_map(feed, class) else {
        return Transformed::Raw(shape.to_value());
    };

    match shape {
        PayloadShape::Opcode { opcode, row } if row.is_array() => {
            Transformed::Opcode(opcode.to_string(), zip_row(fields, row))
        }
        PayloadShape::Snapshot(rows) => {
            Transformed::Records(rows.iter().map(|row| zip_row(fields, row)).collect())
        }
        PayloadShape::Update(row) => Transformed::Record(zip_fields(fields, row)),
        other => Transformed::Raw(other.to_value()),
    }
}

/// Transform `payload` for `feed`, resolving the instrument class from
/// `symbol`.
pub fn transform(payload: &Value, feed: FeedType, symbol: &str) -> Transformed {
    apply_field_map(
        PayloadShape::classify(payload),
        feed,
        InstrumentClass::from_symbol(symbol),
    )
}

/// Map a row that carries its own symbol in the first column
/// (multi-symbol REST responses). The class comes from that symbol and a
/// resulting record gains a `SYMBOL` field.
pub fn transform_symbol_row(
    transformer: &dyn PayloadTransformer,
    row: &[Value],
    feed: FeedType,
) -> Transformed {
    let Some(symbol) = row.first().and_then(Value::as_str) else {
        return Transformed::Raw(Value::Array(row.to_vec()));
    };

    let rest = Value::Array(row[1..].to_vec());
    match transformer.transform(
        PayloadShape::classify(&rest),
        feed,
        InstrumentClass::from_symbol(symbol),
    ) {
        Transformed::Record(mut record) => {
            record.insert(SYMBOL_FIELD.to_string(), Value::String(symbol.to_string()));
            Transformed::Record(record)
        }
        Transformed::Raw(_) => Transformed::Raw(Value::Array(row.to_vec())),
        other => other,
    }
}

/// Converts classified payloads into the values carried by data events.
pub trait PayloadTransformer: Send + Sync {
    fn transform(
        &self,
        shape: PayloadShape<'_>,
        feed: FeedType,
        class: InstrumentClass,
    ) -> Transformed;
}

/// Shared transformer handle held by dispatchers and clients.
pub type SharedTransformer = Arc<dyn PayloadTransformer>;

/// Default transformer: positional payloads become named records.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMapTransformer;

impl PayloadTransformer for FieldMapTransformer {
    fn transform(
        &self,
        shape: PayloadShape<'_>,
        feed: FeedType,
        class: InstrumentClass,
    ) -> Transformed {
        apply_field_map(shape, feed, class)
    }
}

/// Identity transformer: payloads are forwarded as received.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTransformer;

impl PayloadTransformer for RawTransformer {
    fn transform(&self, shape: PayloadShape<'_>, _: FeedType, _: InstrumentClass) -> Transformed {
        Transformed::Raw(shape.to_value())
    }
}

/// Adapter turning a closure into a [`PayloadTransformer`].
pub struct FnTransformer<F> {
    func: F,
}

impl<F> FnTransformer<F>
where
    F: Fn(PayloadShape<'_>, FeedType, InstrumentClass) -> Transformed + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> fmt::Debug for FnTransformer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransformer").finish_non_exhaustive()
    }
}

impl<F> PayloadTransformer for FnTransformer<F>
where
    F: Fn(PayloadShape<'_>, FeedType, InstrumentClass) -> Transformed + Send + Sync,
{
    fn transform(
        &self,
        shape: PayloadShape<'_>,
        feed: FeedType,
        class: InstrumentClass,
    ) -> Transformed {
        (self.func)(shape, feed, class)
    }
}
