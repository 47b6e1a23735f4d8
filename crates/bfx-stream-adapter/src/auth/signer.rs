/*
[INPUT]:  API secret bytes and the message to sign
[OUTPUT]: Lowercase hex HMAC-SHA384 signatures
[POS]:    Auth layer - signing collaborator for the auth command
[UPDATE]: When changing signing algorithm or signature encoding
*/

use aws_lc_rs::hmac;

/// Signs authentication payloads with an API secret.
///
/// Implement this for external signers (HSM, remote vault); the default is
/// [`HmacSha384Signer`].
pub trait PayloadSigner: Send + Sync {
    fn sign(&self, secret: &[u8], message: &str) -> String;
}

/// HMAC-SHA384 with hex encoding, as required by the exchange.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha384Signer;

impl PayloadSigner for HmacSha384Signer {
    fn sign(&self, secret: &[u8], message: &str) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA384, secret);
        let tag = hmac::sign(&key, message.as_bytes());
        hex::encode(tag.as_ref())
    }
}

/// Mock signer for testing
#[derive(Debug, Clone)]
pub struct MockPayloadSigner {
    signature: String,
}

impl MockPayloadSigner {
    /// Create a new mock signer with predetermined signature
    pub fn new(signature: &str) -> Self {
        Self {
            signature: signature.to_string(),
        }
    }
}

impl PayloadSigner for MockPayloadSigner {
    fn sign(&self, _secret: &[u8], _message: &str) -> String {
        self.signature.clone()
    }
}
