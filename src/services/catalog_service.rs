use std::cmp::Ordering;

use crate::{
    errors::CustomError,
    models::catalog::{CatalogQuery, CatalogStats, SortKey, SortOrder, TokenInfo},
};

const TOKENS_JSON: &str = include_str!("../data/tokens.json");

/// Fixed token metadata served to the browse page.
#[derive(Debug, Clone)]
pub struct CatalogService {
    tokens: Vec<TokenInfo>,
}

impl CatalogService {
    pub fn load() -> Result<Self, CustomError> {
        let tokens: Vec<TokenInfo> = serde_json::from_str(TOKENS_JSON)
            .map_err(|e| CustomError::ConfigInvalid(format!("token catalog: {}", e)))?;
        Ok(Self::new(tokens))
    }

    pub fn new(tokens: Vec<TokenInfo>) -> Self {
        Self { tokens }
    }

    pub fn list(&self, query: &CatalogQuery) -> Vec<TokenInfo> {
        let needle = query
            .search
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();

        let mut tokens: Vec<TokenInfo> = self
            .tokens
            .iter()
            .filter(|t| {
                t.token_name.to_lowercase().contains(&needle)
                    || t.symbol.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        let key = query.sort_by.unwrap_or_default();
        let order = query.order.unwrap_or_default();

        tokens.sort_by(|a, b| {
            let ordering = match key {
                SortKey::Name => a.token_name.cmp(&b.token_name),
                SortKey::Price => cmp_f64(a.price_usd, b.price_usd),
                SortKey::MarketCap => cmp_f64(a.market_cap_usd, b.market_cap_usd),
                SortKey::Change => cmp_f64(a.change(), b.change()),
            };
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        tokens
    }

    pub fn stats(&self) -> Option<CatalogStats> {
        let first = self.tokens.first()?;

        let total_market_cap_usd = self.tokens.iter().map(|t| t.market_cap_usd).sum();
        let average_price_usd =
            self.tokens.iter().map(|t| t.price_usd).sum::<f64>() / self.tokens.len() as f64;

        // ties keep the earliest entry
        let mut top_gainer = first;
        let mut top_loser = first;
        for token in &self.tokens[1..] {
            if token.change() > top_gainer.change() {
                top_gainer = token;
            }
            if token.change() < top_loser.change() {
                top_loser = token;
            }
        }

        Some(CatalogStats {
            total_market_cap_usd,
            average_price_usd,
            top_gainer: top_gainer.clone(),
            top_loser: top_loser.clone(),
        })
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(name: &str, symbol: &str, price: f64, cap: f64, change: &str) -> TokenInfo {
        TokenInfo {
            token_name: name.to_string(),
            symbol: symbol.to_string(),
            contract_address: "0x0000000000000000000000000000000000000001".to_string(),
            image: String::new(),
            supply: 1000,
            price_usd: price,
            market_cap_usd: cap,
            percentage: change.to_string(),
        }
    }

    fn catalog() -> CatalogService {
        CatalogService::new(vec![
            token("Alpha", "ALP", 0.5, 100.0, "2.0"),
            token("Bravo", "BRV", 0.1, 300.0, "-4.5"),
            token("Charlie", "CHL", 1.5, 200.0, "10"),
        ])
    }

    fn symbols(tokens: &[TokenInfo]) -> Vec<&str> {
        tokens.iter().map(|t| t.symbol.as_str()).collect()
    }

    #[test]
    fn test_embedded_fixture_loads() {
        let catalog = CatalogService::load().unwrap();
        assert!(!catalog.list(&CatalogQuery::default()).is_empty());
        assert!(catalog.stats().is_some());
    }

    #[test]
    fn test_default_sort_is_market_cap_desc() {
        let listed = catalog().list(&CatalogQuery::default());
        assert_eq!(symbols(&listed), vec!["BRV", "CHL", "ALP"]);
    }

    #[test]
    fn test_sort_by_name_and_change() {
        let by_name = catalog().list(&CatalogQuery {
            sort_by: Some(SortKey::Name),
            order: Some(SortOrder::Asc),
            ..Default::default()
        });
        assert_eq!(symbols(&by_name), vec!["ALP", "BRV", "CHL"]);

        let by_change = catalog().list(&CatalogQuery {
            sort_by: Some(SortKey::Change),
            order: Some(SortOrder::Desc),
            ..Default::default()
        });
        assert_eq!(symbols(&by_change), vec!["CHL", "ALP", "BRV"]);
    }

    #[test]
    fn test_search_matches_name_or_symbol_case_insensitively() {
        let by_name = catalog().list(&CatalogQuery {
            search: Some("brav".to_string()),
            ..Default::default()
        });
        assert_eq!(symbols(&by_name), vec!["BRV"]);

        let by_symbol = catalog().list(&CatalogQuery {
            search: Some("chl".to_string()),
            ..Default::default()
        });
        assert_eq!(symbols(&by_symbol), vec!["CHL"]);
    }

    #[test]
    fn test_stats() {
        let stats = catalog().stats().unwrap();
        assert_eq!(stats.total_market_cap_usd, 600.0);
        assert!((stats.average_price_usd - 0.7).abs() < 1e-9);
        assert_eq!(stats.top_gainer.symbol, "CHL");
        assert_eq!(stats.top_loser.symbol, "BRV");
    }

    #[test]
    fn test_empty_catalog_has_no_stats() {
        assert!(CatalogService::new(Vec::new()).stats().is_none());
    }
}
