/*
[INPUT]:  Symbols, candle timeframes and sections
[OUTPUT]: Transformed market data records (tickers, candles)
[POS]:    HTTP layer - public v2 endpoints (no auth required)
[UPDATE]: When adding new public endpoints or changing response format
*/

use reqwest::Method;
use serde_json::Value;

use crate::error::{BfxError, Result};
use crate::http::BfxRestClient;
use crate::transform::{PayloadShape, Transformed, transform_symbol_row};
use crate::types::{FeedType, InstrumentClass};

impl BfxRestClient {
    /// Ticker for one symbol
    ///
    /// GET /v2/ticker/{symbol}
    pub async fn ticker(&self, symbol: &str) -> Result<Transformed> {
        let endpoint = format!("v2/ticker/{symbol}");
        let builder = self.request(Method::GET, &endpoint)?;
        let payload: Value = self.send_json(builder).await?;
        Ok(self.apply(&payload, FeedType::Ticker, symbol))
    }

    /// Tickers for several symbols; every row carries its own symbol.
    ///
    /// GET /v2/tickers?symbols={symbols}
    pub async fn tickers(&self, symbols: &[&str]) -> Result<Vec<Transformed>> {
        let builder = self
            .request(Method::GET, "v2/tickers")?
            .query(&[("symbols", symbols.join(","))]);
        let payload: Value = self.send_json(builder).await?;

        let rows = match payload {
            Value::Array(rows) => rows,
            other => {
                return Err(BfxError::InvalidResponse(format!(
                    "expected an array of ticker rows, got {other}"
                )));
            }
        };

        Ok(rows
            .iter()
            .map(|row| match row.as_array() {
                Some(row) => transform_symbol_row(self.transformer.as_ref(), row, FeedType::Ticker),
                None => Transformed::Raw(row.clone()),
            })
            .collect())
    }

    /// Candles for `trade:{timeframe}:{symbol}`. `section` is `last` for a
    /// single candle or `hist` for a list.
    ///
    /// GET /v2/candles/trade:{timeframe}:{symbol}/{section}
    pub async fn candles(&self, timeframe: &str, symbol: &str, section: &str) -> Result<Transformed> {
        let endpoint = format!("v2/candles/trade:{timeframe}:{symbol}/{section}");
        let builder = self.request(Method::GET, &endpoint)?;
        let payload: Value = self.send_json(builder).await?;
        Ok(self.apply(&payload, FeedType::Candles, symbol))
    }

    fn apply(&self, payload: &Value, feed: FeedType, symbol: &str) -> Transformed {
        self.transformer.transform(
            PayloadShape::classify(payload),
            feed,
            InstrumentClass::from_symbol(symbol),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::error::BfxError;
    use crate::http::{BfxRestClient, ClientConfig};
    use crate::transform::{RawTransformer, Transformed};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BfxRestClient {
        BfxRestClient::with_config_and_base_url(ClientConfig::default(), &server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_ticker_is_named() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/ticker/tBTCUSD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                7616.5, 31.89, 7617.5, 43.36, -550.8, -0.0674, 7617.1, 8314.71, 8257.8, 7500
            ])))
            .mount(&server)
            .await;

        let result = client_for(&server).ticker("tBTCUSD").await.unwrap();
        let record = result.as_record().unwrap();

        assert_eq!(record.len(), 10);
        assert_eq!(record["BID"], json!(7616.5));
        assert_eq!(record["LOW"], json!(7500));
    }

    #[tokio::test]
    async fn test_tickers_mixed_classes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/tickers"))
            .and(query_param("symbols", "tBTCUSD,fUSD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                ["tBTCUSD", 7616.5, 31.89, 7617.5, 43.36, -550.8, -0.0674, 7617.1, 8314.71, 8257.8, 7500],
                ["fUSD", 0.0003, 0.0002, 1000, 30, 0.00025, 500, 2, 0.00001, 0.04, 0.00026, 12000, 0.0003, 0.0001]
            ])))
            .mount(&server)
            .await;

        let results = client_for(&server).tickers(&["tBTCUSD", "fUSD"]).await.unwrap();

        assert_eq!(results.len(), 2);
        let trading = results[0].as_record().unwrap();
        assert_eq!(trading["SYMBOL"], json!("tBTCUSD"));
        assert_eq!(trading["LAST_PRICE"], json!(7617.1));
        let funding = results[1].as_record().unwrap();
        assert_eq!(funding["SYMBOL"], json!("fUSD"));
        assert_eq!(funding["FRR"], json!(0.0003));
        assert_eq!(funding["BID_PERIOD"], json!(30));
    }

    #[tokio::test]
    async fn test_candles_hist_fans_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/candles/trade:1m:tBTCUSD/hist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                [1574698260000_u64, 7379.8, 7379.8, 7379.8, 7379.8, 0.1],
                [1574698200000_u64, 7385.1, 7380.2, 7385.1, 7380.2, 1.5]
            ])))
            .mount(&server)
            .await;

        let result = client_for(&server).candles("1m", "tBTCUSD", "hist").await.unwrap();
        let records = result.as_records().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["MTS"], json!(1574698260000_u64));
        assert_eq!(records[1]["VOLUME"], json!(1.5));
    }

    #[tokio::test]
    async fn test_raw_transformer_passes_through() {
        let server = MockServer::start().await;
        let body = json!([1574698260000_u64, 7379.8, 7379.8, 7379.8, 7379.8, 0.1]);
        Mock::given(method("GET"))
            .and(path("/v2/candles/trade:1m:tBTCUSD/last"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let client = client_for(&server).with_transformer(Arc::new(RawTransformer));
        let result = client.candles("1m", "tBTCUSD", "last").await.unwrap();

        assert_eq!(result, Transformed::Raw(body));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/ticker/tNOPE"))
            .respond_with(ResponseTemplate::new(500).set_body_string(r#"["error",10020,"symbol: invalid"]"#))
            .mount(&server)
            .await;

        let err = client_for(&server).ticker("tNOPE").await.unwrap_err();

        match err {
            BfxError::Api { code, message } => {
                assert_eq!(code, 500);
                assert!(message.contains("symbol: invalid"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
