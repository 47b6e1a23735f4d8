/*
[INPUT]:  API credentials and signing configuration
[OUTPUT]: Signatures and nonces for the auth command
[POS]:    Auth layer - handles account channel authentication inputs
[UPDATE]: When auth flow or signature methods change
*/

pub mod credentials;
pub mod nonce;
pub mod signer;

pub use credentials::Credentials;
pub use nonce::{FixedNonce, MonotonicNonce, NonceSource};
pub use signer::{HmacSha384Signer, MockPayloadSigner, PayloadSigner};
