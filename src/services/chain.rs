//! Capabilities the exchange needs from a chain, kept narrow so the
//! orchestration can run against the ethers adapters or in-memory fakes.

use std::{str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use ethers::{
    types::{Address, TxHash, U256},
    utils::to_checksum,
};
use serde::Serialize;

use crate::{errors::CustomError, models::token::Balance};

const PLACEHOLDER_ADDRESS: &str = "0x1234567890123456789012345678901234567890";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReceiptStatus {
    Success,
    Failure,
}

/// An ERC-20 `Transfer` event found in a transaction receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTransfer {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

#[async_trait]
pub trait BalanceReader: Send + Sync {
    async fn native_balance(&self, address: Address) -> Result<Balance, CustomError>;

    async fn token_balance(&self, token: Address, owner: Address) -> Result<Balance, CustomError>;
}

/// Something that can sign and broadcast transfers from one account.
#[async_trait]
pub trait TransferSubmitter: Send + Sync {
    fn address(&self) -> Address;

    async fn submit_native_transfer(&self, to: Address, amount: U256)
        -> Result<TxHash, CustomError>;

    async fn estimate_token_transfer_gas(
        &self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<U256, CustomError>;

    async fn submit_token_transfer(
        &self,
        token: Address,
        to: Address,
        amount: U256,
        gas: Option<U256>,
    ) -> Result<TxHash, CustomError>;
}

#[async_trait]
pub trait ReceiptWaiter: Send + Sync {
    /// Returns `TransactionTimeout` if no receipt shows up within `timeout`.
    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        timeout: Duration,
    ) -> Result<ReceiptStatus, CustomError>;

    /// ERC-20 transfers logged by an already mined transaction.
    async fn token_transfers(&self, hash: TxHash) -> Result<Vec<TokenTransfer>, CustomError>;
}

pub trait WalletFactory: Send + Sync {
    fn custodial_wallet(&self, signing_key: &str)
        -> Result<Arc<dyn TransferSubmitter>, CustomError>;

    /// Wrap a payment the user signed client-side. Must be signed by `user`.
    fn user_payment(
        &self,
        signed_payment: &str,
        user: Address,
    ) -> Result<Arc<dyn TransferSubmitter>, CustomError>;
}

/// Parse a `0x`-prefixed 20-byte address. Mixed-case input must carry a
/// valid EIP-55 checksum.
pub fn parse_address(input: &str) -> Option<Address> {
    let hex = input.strip_prefix("0x")?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let address = Address::from_str(hex).ok()?;

    let mixed_case = hex.chars().any(|c| c.is_ascii_lowercase())
        && hex.chars().any(|c| c.is_ascii_uppercase());
    if mixed_case && to_checksum(&address, None) != input {
        return None;
    }

    Some(address)
}

pub fn is_placeholder_address(input: &str) -> bool {
    let lower = input.to_ascii_lowercase();
    lower == PLACEHOLDER_ADDRESS || parse_address(&lower) == Some(Address::zero())
}

pub fn parse_tx_hash(input: &str) -> Option<TxHash> {
    let hex = input.strip_prefix("0x")?;
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    TxHash::from_str(hex).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lowercase_address() {
        let addr = parse_address("0x5fbdb2315678afecb367f032d93f642f64180aa3").unwrap();
        assert_eq!(
            format!("{:?}", addr),
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        );
    }

    #[test]
    fn test_parse_checksummed_address() {
        assert!(parse_address("0x5FbDB2315678afecb367f032d93F642f64180aa3").is_some());
        // one letter's case flipped
        assert!(parse_address("0x5fbDB2315678afecb367f032d93F642f64180aa3").is_none());
    }

    #[test]
    fn test_reject_malformed_addresses() {
        assert!(parse_address("").is_none());
        assert!(parse_address("5fbdb2315678afecb367f032d93f642f64180aa3").is_none());
        assert!(parse_address("0x5fbdb2315678afecb367f032d93f642f64180a").is_none());
        assert!(parse_address("0xzzbdb2315678afecb367f032d93f642f64180aa3").is_none());
    }

    #[test]
    fn test_placeholders() {
        assert!(is_placeholder_address(PLACEHOLDER_ADDRESS));
        assert!(is_placeholder_address(
            "0x0000000000000000000000000000000000000000"
        ));
        assert!(!is_placeholder_address(
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        ));
    }

    #[test]
    fn test_parse_tx_hash() {
        let raw = format!("0x{}", "ab".repeat(32));
        assert_eq!(format!("{:?}", parse_tx_hash(&raw).unwrap()), raw);
        assert!(parse_tx_hash("0xabc").is_none());
        assert!(parse_tx_hash(&"ab".repeat(32)).is_none());
    }
}
