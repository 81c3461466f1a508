use std::time::Duration;

use ethers::{types::U256, utils::parse_ether};

use crate::{
    errors::CustomError,
    models::exchange::Validation,
    services::chain::{is_placeholder_address, parse_address},
};

pub const PLACEHOLDER_PRIVATE_KEY: &str =
    "0x1234567890123456789012345678901234567890123456789012345678901234";

const DEFAULT_RPC_URL: &str = "https://api.avax-test.network/ext/bc/C/rpc";
const DEFAULT_CHAIN_ID: u64 = 43113;
const DEFAULT_PRICE_ASSET_ID: &str = "avalanche-2";
const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub rpc_url: String,
    pub chain_id: u64,
    pub custodial_wallet_address: Option<String>,
    pub custodial_wallet_signing_key: Option<String>,
    pub token_contract_address: Option<String>,
    /// Default amount for the free faucet drip, in 18-decimal token units.
    pub claim_amount: U256,
    pub price_api_key: Option<String>,
    pub price_asset_id: String,
    pub receipt_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, CustomError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CustomError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| CustomError::ConfigInvalid(format!("Failed to parse PORT: {}", raw)))?,
            None => 8080,
        };

        let chain_id = match get("CHAIN_ID") {
            Some(raw) => raw.parse().map_err(|_| {
                CustomError::ConfigInvalid(format!("Failed to parse CHAIN_ID: {}", raw))
            })?,
            None => DEFAULT_CHAIN_ID,
        };

        let claim_amount = parse_ether(get("CLAIM_AMOUNT").unwrap_or_else(|| "1".to_string()))
            .map_err(|e| {
                CustomError::ConfigInvalid(format!("Failed to parse CLAIM_AMOUNT: {}", e))
            })?;

        let receipt_timeout = match get("RECEIPT_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                CustomError::ConfigInvalid(format!("Failed to parse RECEIPT_TIMEOUT_SECS: {}", raw))
            })?),
            None => Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS),
        };

        Ok(Self {
            port,
            rpc_url: get("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            chain_id,
            custodial_wallet_address: get("FAT_WALLET_ADDRESS"),
            custodial_wallet_signing_key: get("FAT_WALLET_PRIVATE_KEY"),
            token_contract_address: get("TOKEN_CONTRACT_ADDRESS"),
            claim_amount,
            price_api_key: get("PRICE_API_KEY"),
            price_asset_id: get("PRICE_ASSET_ID")
                .unwrap_or_else(|| DEFAULT_PRICE_ASSET_ID.to_string()),
            receipt_timeout,
        })
    }

    /// Check the custodial wallet settings. Reports the first problem found.
    pub fn validate(&self) -> Validation {
        let key = match self.custodial_wallet_signing_key.as_deref() {
            Some(key) if key != PLACEHOLDER_PRIVATE_KEY => key,
            _ => return Validation::invalid("Fat wallet private key not configured properly"),
        };

        match self.token_contract_address.as_deref() {
            Some(addr) if !is_placeholder_address(addr) && parse_address(addr).is_some() => {}
            _ => return Validation::invalid("Token contract address not configured properly"),
        }

        match self.custodial_wallet_address.as_deref() {
            Some(addr) if !is_placeholder_address(addr) && parse_address(addr).is_some() => {}
            _ => return Validation::invalid("Fat wallet address not configured properly"),
        }

        if normalize_private_key(key).is_none() {
            return Validation::invalid(
                "Invalid private key format. Must be 64 hex characters with 0x prefix.",
            );
        }

        Validation::valid()
    }

    /// The validated signing key, `0x`-prefixed.
    pub fn signing_key(&self) -> Result<String, CustomError> {
        self.ensure_valid()?;
        self.custodial_wallet_signing_key
            .as_deref()
            .and_then(normalize_private_key)
            .ok_or(CustomError::InternalServerError)
    }

    pub fn ensure_valid(&self) -> Result<(), CustomError> {
        let validation = self.validate();
        match validation.reason {
            Some(reason) if !validation.valid => Err(CustomError::ConfigInvalid(reason)),
            _ => Ok(()),
        }
    }
}

/// Prefix the key with `0x` when missing and check it decodes to 32 bytes.
pub fn normalize_private_key(key: &str) -> Option<String> {
    let key = key.trim();
    let prefixed = if key.starts_with("0x") {
        key.to_string()
    } else {
        format!("0x{}", key)
    };

    if prefixed.len() != 66 || !prefixed[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    Some(prefixed)
}
