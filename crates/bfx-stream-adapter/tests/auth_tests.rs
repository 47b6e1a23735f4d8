/*
[INPUT]:  Credentials, fixed nonces, signer doubles
[OUTPUT]: Test results for the auth command
[POS]:    Integration tests - authentication
[UPDATE]: When auth payload or signing changes
*/

use std::sync::Arc;

use bfx_stream_adapter::ws::commands;
use bfx_stream_adapter::{
    BfxError, BfxWebSocket, Credentials, FixedNonce, HmacSha384Signer, MockPayloadSigner,
    PayloadSigner,
};
use serde_json::json;
use tokio_test::assert_ok;

#[test]
fn test_hmac_sha384_rfc4231_vector() {
    let signature = HmacSha384Signer.sign(b"Jefe", "what do ya want for nothing?");

    assert_eq!(
        signature,
        "af45d2e376484031617f78d2b58a6b1b9c7ef464f5a01b47e42ec3736322445e8e2240ca5e69e2c78b3239ecfab21649"
    );
}

#[test]
fn test_auth_command_uses_injected_signer() {
    let credentials = Credentials::new("key", "secret");
    let signer = MockPayloadSigner::new("deadbeef");

    let message = assert_ok!(commands::auth(Some(&credentials), &signer, &FixedNonce(42), 1));

    assert_eq!(
        message,
        json!({
            "event": "auth",
            "apiKey": "key",
            "authSig": "deadbeef",
            "authPayload": "AUTH4242",
            "authNonce": 43,
            "calc": 1,
        })
    );
}

#[tokio::test]
async fn test_authenticate_fails_fast_without_credentials() {
    let ws = BfxWebSocket::new().with_signer(Arc::new(MockPayloadSigner::new("unused")));

    let err = ws.authenticate(0).await.unwrap_err();

    assert!(matches!(err, BfxError::Config(_)));
}

#[tokio::test]
async fn test_authenticate_with_credentials_needs_connection() {
    let ws = BfxWebSocket::new()
        .with_credentials(Credentials::new("key", "secret"))
        .with_nonce_source(Arc::new(FixedNonce(1)));

    let err = ws.authenticate(0).await.unwrap_err();

    assert!(matches!(err, BfxError::WebSocket(_)));
}
