/*
[INPUT]:  HTTP client configuration and public API endpoints
[OUTPUT]: Transformed REST responses
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod public;

pub use client::{BfxRestClient, ClientConfig, REST_BASE_URL};
