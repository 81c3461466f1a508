use log::error;
use serde::{Deserialize, Serialize};

use crate::errors::CustomError;

use super::exchange_service::NATIVE_PER_TOKEN;

const COINGECKO_API: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Serialize)]
pub struct NativePrice {
    pub asset_id: String,
    pub usd: f64,
    /// Implied by the fixed token rate.
    pub token_usd: f64,
}

#[derive(Debug, Deserialize)]
struct CoinResponse {
    market_data: MarketData,
}

#[derive(Debug, Deserialize)]
struct MarketData {
    current_price: CurrentPrice,
}

#[derive(Debug, Deserialize)]
struct CurrentPrice {
    usd: f64,
}

/// USD price of the native currency from CoinGecko.
#[derive(Debug, Clone)]
pub struct PriceService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    asset_id: String,
}

impl PriceService {
    pub fn new(api_key: Option<String>, asset_id: String) -> Self {
        Self::with_base_url(COINGECKO_API, api_key, asset_id)
    }

    pub fn with_base_url(base_url: &str, api_key: Option<String>, asset_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            asset_id,
        }
    }

    pub async fn native_price(&self) -> Result<NativePrice, CustomError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CustomError::ConfigInvalid("PRICE_API_KEY is not set".to_string()))?;

        let url = format!("{}/coins/{}", self.base_url, self.asset_id);
        let response = self
            .client
            .get(&url)
            .header("x_cg_demo_api_key", api_key)
            .send()
            .await
            .map_err(|e| CustomError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            error!("price lookup for {} returned {}", self.asset_id, response.status());
            return Err(CustomError::NetworkError(format!(
                "price lookup failed with status {}",
                response.status()
            )));
        }

        let body: CoinResponse = response
            .json()
            .await
            .map_err(|e| CustomError::NetworkError(e.to_string()))?;

        Ok(quote(&self.asset_id, body.market_data.current_price.usd))
    }
}

fn quote(asset_id: &str, usd: f64) -> NativePrice {
    let rate: f64 = NATIVE_PER_TOKEN.parse().unwrap_or_default();
    NativePrice {
        asset_id: asset_id.to_string(),
        usd,
        token_usd: usd * rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coingecko_body() {
        let body = r#"{"id":"avalanche-2","market_data":{"current_price":{"usd":31.5,"eur":29.0}}}"#;
        let parsed: CoinResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.market_data.current_price.usd, 31.5);
    }

    #[test]
    fn test_token_price_follows_rate() {
        let price = quote("avalanche-2", 30.0);
        assert!((price.token_usd - 0.3).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let service = PriceService::with_base_url("http://127.0.0.1:1", None, "avalanche-2".into());
        assert!(matches!(
            service.native_price().await,
            Err(CustomError::ConfigInvalid(_))
        ));
    }
}
