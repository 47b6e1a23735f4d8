/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed stream configuration
[POS]:    Configuration layer - stream setup
[UPDATE]: When adding new configuration options
*/

use anyhow::{Context, bail};
use bfx_stream_adapter::ws::commands::{DEFAULT_BOOK_LENGTH, DEFAULT_PRECISION};
use serde::{Deserialize, Serialize};

/// Top-level configuration for the stream runner
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Stream URL; the public endpoint when omitted
    #[serde(default)]
    pub url: Option<String>,
    /// Authenticate the account channel with BFX_API_KEY / BFX_API_SECRET
    #[serde(default)]
    pub authenticate: bool,
    /// `calc` value sent with the auth command
    #[serde(default)]
    pub calc: u32,
    #[serde(default)]
    pub transform: TransformMode,
    /// `conf` flags sent right after connecting
    #[serde(default)]
    pub flags: Option<u64>,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionConfig>,
}

/// How data payloads reach the event log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// Named fields
    #[default]
    Fields,
    /// Payloads as received
    Raw,
}

/// One channel subscription
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum SubscriptionConfig {
    Ticker {
        symbol: String,
    },
    Trades {
        symbol: String,
    },
    Book {
        symbol: String,
        #[serde(default = "default_precision")]
        prec: String,
        #[serde(default = "default_book_length")]
        len: u32,
    },
    Candles {
        /// `trade:<timeframe>:<symbol>`
        key: String,
    },
}

fn default_precision() -> String {
    DEFAULT_PRECISION.to_string()
}

fn default_book_length() -> u32 {
    DEFAULT_BOOK_LENGTH
}

impl StreamConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate().context("validate config")?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.subscriptions.is_empty() && !self.authenticate {
            bail!("nothing to stream: no subscriptions and authenticate is false");
        }

        for subscription in &self.subscriptions {
            match subscription {
                SubscriptionConfig::Ticker { symbol }
                | SubscriptionConfig::Trades { symbol }
                | SubscriptionConfig::Book { symbol, .. }
                    if symbol.is_empty() =>
                {
                    bail!("subscription symbol must not be empty");
                }
                SubscriptionConfig::Book { len: 0, .. } => {
                    bail!("book length must be positive");
                }
                SubscriptionConfig::Candles { key } if key.split(':').nth(2).is_none() => {
                    bail!("candles key must look like trade:<timeframe>:<symbol>, got {key}");
                }
                _ => {}
            }
        }
        Ok(())
    }
}
