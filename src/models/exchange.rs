use serde::{Deserialize, Serialize};

use super::{network_config::NetworkConfig, token::Balance};

/// Result of a read-only precondition check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Validation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Amounts are decimal token strings such as "1.5".
#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub user_address: String,
    pub amount: String,
    /// Signed raw native payment, 0x-prefixed RLP.
    pub signed_payment: String,
}

#[derive(Debug, Deserialize)]
pub struct FreeClaimRequest {
    pub user_address: String,
    pub amount: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SellRequest {
    pub user_address: String,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteSellRequest {
    pub user_address: String,
    pub amount: String,
    pub transfer_hash: String,
}

#[derive(Debug, Serialize)]
pub struct WalletBalances {
    pub address: String,
    pub native: Balance,
    pub token: Balance,
}

#[derive(Debug, Serialize)]
pub struct FaucetStatus {
    pub network: NetworkConfig,
    pub address: String,
    pub native: Balance,
    pub token: Balance,
    pub native_per_token: String,
    pub claim_amount: Balance,
}
