/*
[INPUT]:  Positional payloads from data channels and REST responses
[OUTPUT]: Named records keyed by the static field maps
[POS]:    Transform layer - field map registry and mapping pipeline
[UPDATE]: When adding feeds or transformer plug-ins
*/

pub mod maps;
pub mod pipeline;

pub use maps::field_map;
pub use pipeline::{
    FieldMapTransformer,
    FnTransformer,
    PayloadShape,
    PayloadTransformer,
    RawTransformer,
    Record,
    SharedTransformer,
    Transformed,
    apply_field_map,
    transform,
    transform_symbol_row,
};
