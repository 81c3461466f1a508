use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub token_name: String,
    pub symbol: String,
    pub contract_address: String,
    pub image: String,
    pub supply: u64,
    pub price_usd: f64,
    pub market_cap_usd: f64,
    /// 24h change, signed decimal string.
    pub percentage: String,
}

impl TokenInfo {
    pub fn change(&self) -> f64 {
        self.percentage.parse().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Price,
    #[default]
    MarketCap,
    Change,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub sort_by: Option<SortKey>,
    pub order: Option<SortOrder>,
}

#[derive(Debug, Serialize)]
pub struct CatalogStats {
    pub total_market_cap_usd: f64,
    pub average_price_usd: f64,
    pub top_gainer: TokenInfo,
    pub top_loser: TokenInfo,
}
