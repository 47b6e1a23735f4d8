/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public channel-protocol adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod auth;
pub mod error;
pub mod http;
pub mod transform;
pub mod types;
pub mod ws;

// Re-export commonly used types from auth
pub use auth::{
    Credentials,
    FixedNonce,
    HmacSha384Signer,
    MockPayloadSigner,
    MonotonicNonce,
    NonceSource,
    PayloadSigner,
};

pub use error::{BfxError, Result};

// Re-export commonly used types from http
pub use http::{BfxRestClient, ClientConfig};

pub use transform::{
    FieldMapTransformer,
    FnTransformer,
    PayloadShape,
    PayloadTransformer,
    RawTransformer,
    Record,
    SharedTransformer,
    Transformed,
};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    BfxWebSocket,
    ChannelRegistry,
    ControlEvent,
    DataEvent,
    Dispatch,
    Dispatcher,
    EventKind,
    EventListeners,
    StreamEvent,
    WsConfig,
};
