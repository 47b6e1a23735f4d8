/*
[INPUT]:  API key/secret from configuration or environment
[OUTPUT]: Credentials for the authenticated account channel
[POS]:    Auth layer - credential storage and resolution
[UPDATE]: When adding credential sources
*/

use std::fmt;

pub const API_KEY_ENV: &str = "BFX_API_KEY";
pub const API_SECRET_ENV: &str = "BFX_API_SECRET";

/// API key pair. The secret never appears in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: Box<[u8]>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into().into_bytes().into_boxed_slice(),
        }
    }

    /// Load from `BFX_API_KEY` / `BFX_API_SECRET`.
    ///
    /// Returns `None` if either variable is unset or empty.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|v| !v.is_empty())?;
        let api_secret = std::env::var(API_SECRET_ENV).ok().filter(|v| !v.is_empty())?;
        Some(Self::new(api_key, api_secret))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> &[u8] {
        &self.api_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
