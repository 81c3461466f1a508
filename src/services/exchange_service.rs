use std::sync::Arc;

use ethers::types::{Address, TxHash, U256};
use log::{error, info, warn};
use tokio::sync::{Mutex, OnceCell};
use uuid::Uuid;

use crate::{
    config::Config,
    errors::{classify_error, CustomError},
    models::{
        exchange::{FaucetStatus, Validation, WalletBalances},
        network_config::NetworkConfig,
        settlement::{OperationStage, SettlementKind, SettlementRecord},
        token::{format_units, Balance},
        transaction::TransactionResult,
    },
};

use super::{
    chain::{
        parse_address, parse_tx_hash, BalanceReader, ReceiptStatus, ReceiptWaiter,
        TransferSubmitter, WalletFactory,
    },
    journal::{SettlementJournal, SpentTransfers},
    network_config::get_network_config,
};

/// 1 token = 0.01 native, as an 18-decimal fixed-point factor.
pub const NATIVE_PER_TOKEN: &str = "0.01";
const RATE_SCALED: u64 = 10_000_000_000_000_000;
const UNIT_SCALED: u64 = 1_000_000_000_000_000_000;

/// Headroom the claiming user must keep above the payment for their own gas.
const USER_GAS_RESERVE: u64 = 2_000_000_000_000_000;
/// Minimum native balance for the custodial wallet to pay token transfer gas.
const CUSTODIAL_MIN_GAS: u64 = 1_000_000_000_000_000;
/// Kept on top of a sell payout for the payout's own gas.
const PAYOUT_GAS_RESERVE: u64 = 1_000_000_000_000_000;
/// Minimum native balance a seller needs to send their token transfer.
const SELLER_MIN_GAS: u64 = 1_000_000_000_000_000;
const TOKEN_TRANSFER_GAS_HEADROOM: u64 = 10_000;

/// Native currency owed for `token_amount`, both in 18-decimal units.
pub fn native_for_tokens(token_amount: U256) -> Result<U256, CustomError> {
    token_amount
        .checked_mul(U256::from(RATE_SCALED))
        .map(|scaled| scaled / U256::from(UNIT_SCALED))
        .ok_or_else(|| CustomError::InvalidAmountError("amount too large".to_string()))
}

/// Coordinates the two-leg swaps between users and the custodial wallet.
///
/// Every public operation reports failure through its return value. Nothing
/// is retried; a failed invocation can simply be issued again.
pub struct ExchangeService {
    config: Config,
    network: NetworkConfig,
    balances: Arc<dyn BalanceReader>,
    receipts: Arc<dyn ReceiptWaiter>,
    wallets: Arc<dyn WalletFactory>,
    // built once; the wallet hands out nonces for every custodial submission
    custodial: OnceCell<Arc<dyn TransferSubmitter>>,
    // keeps nonce allocation and broadcast in the same order
    custodial_lock: Mutex<()>,
    journal: SettlementJournal,
    spent_transfers: SpentTransfers,
}

impl ExchangeService {
    pub fn new<C>(config: Config, chain: Arc<C>) -> Result<Self, CustomError>
    where
        C: BalanceReader + ReceiptWaiter + WalletFactory + 'static,
    {
        let network = get_network_config(config.chain_id)?;

        Ok(Self {
            config,
            network,
            balances: chain.clone(),
            receipts: chain.clone(),
            wallets: chain,
            custodial: OnceCell::new(),
            custodial_lock: Mutex::new(()),
            journal: SettlementJournal::new(),
            spent_transfers: SpentTransfers::new(),
        })
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn validate_config(&self) -> Validation {
        self.config.validate()
    }

    /// User pays `token_amount * rate` to the custodial wallet, then the
    /// custodial wallet sends `token_amount` tokens back.
    pub async fn claim_with_payment(
        &self,
        user_address: &str,
        token_amount: U256,
        user_signer: &dyn TransferSubmitter,
    ) -> TransactionResult {
        let id = self
            .journal
            .open(SettlementKind::Claim, user_address, token_amount);
        let result = self
            .try_claim_with_payment(id, user_address, token_amount, user_signer)
            .await;
        self.finish(id, "claim with payment", result)
    }

    /// `claim_with_payment` with a payment the user signed client-side.
    pub async fn claim_with_signed_payment(
        &self,
        user_address: &str,
        token_amount: U256,
        signed_payment: &str,
    ) -> TransactionResult {
        let signer = match self.user_payment_signer(user_address, signed_payment) {
            Ok(signer) => signer,
            Err(e) => {
                let reason = classify_error(&e);
                warn!("rejecting signed payment from {}: {}", user_address, reason);
                return TransactionResult::failed(reason);
            }
        };

        self.claim_with_payment(user_address, token_amount, signer.as_ref())
            .await
    }

    /// Free faucet drip: the custodial wallet sends tokens with no payment.
    pub async fn claim_tokens(
        &self,
        user_address: &str,
        token_amount: Option<U256>,
    ) -> TransactionResult {
        let token_amount = token_amount.unwrap_or(self.config.claim_amount);
        let id = self
            .journal
            .open(SettlementKind::FreeClaim, user_address, token_amount);
        let result = self.try_claim_tokens(id, user_address, token_amount).await;
        self.finish(id, "claim", result)
    }

    /// Read-only checks before the user sends tokens to the custodial wallet.
    pub async fn sell_validate(&self, user_address: &str, token_amount: U256) -> Validation {
        match self.try_sell_validate(user_address, token_amount).await {
            Ok(()) => Validation::valid(),
            Err(e) => {
                let reason = classify_error(&e);
                warn!("sell validation failed for {}: {}", user_address, reason);
                Validation::invalid(reason)
            }
        }
    }

    /// Pay the user back once their token transfer (`user_transfer_hash`) is
    /// confirmed. The transaction must move at least `token_amount` of the
    /// configured token from the user to the custodial wallet, and each
    /// transfer pays out at most once.
    pub async fn complete_sell_transaction(
        &self,
        user_address: &str,
        token_amount: U256,
        user_transfer_hash: &str,
    ) -> TransactionResult {
        let id = self
            .journal
            .open(SettlementKind::Sell, user_address, token_amount);
        let result = self
            .try_complete_sell(id, user_address, token_amount, user_transfer_hash)
            .await;
        self.finish(id, "complete sell", result)
    }

    pub async fn balances(&self, address: &str) -> Result<WalletBalances, CustomError> {
        let owner = self.user_address(address)?;
        let token = self.token_address()?;

        Ok(WalletBalances {
            address: address.to_string(),
            native: self.balances.native_balance(owner).await?,
            token: self.balances.token_balance(token, owner).await?,
        })
    }

    pub async fn faucet_status(&self) -> Result<FaucetStatus, CustomError> {
        let custodial = self.custodial_wallet().await?;
        let token = self.token_address()?;
        let address = custodial.address();

        Ok(FaucetStatus {
            network: self.network.clone(),
            address: format!("{:?}", address),
            native: self.balances.native_balance(address).await?,
            token: self.balances.token_balance(token, address).await?,
            native_per_token: NATIVE_PER_TOKEN.to_string(),
            claim_amount: Balance::from_raw(self.config.claim_amount),
        })
    }

    pub fn settlements(&self) -> Vec<SettlementRecord> {
        self.journal.snapshot()
    }

    pub fn settlement(&self, id: Uuid) -> Option<SettlementRecord> {
        self.journal.get(id)
    }

    pub fn stranded_settlements(&self) -> Vec<SettlementRecord> {
        self.journal.stranded()
    }

    async fn try_claim_with_payment(
        &self,
        id: Uuid,
        user_address: &str,
        token_amount: U256,
        user_signer: &dyn TransferSubmitter,
    ) -> Result<TxHash, CustomError> {
        self.journal.advance(id, OperationStage::Validating);
        self.config.ensure_valid()?;
        let user = self.user_address(user_address)?;
        let token = self.token_address()?;
        let fat_wallet = self.fat_wallet_address()?;
        if token_amount.is_zero() {
            return Err(CustomError::ZeroAmount);
        }

        let required_payment = native_for_tokens(token_amount)?;

        let user_native = self.balances.native_balance(user).await?;
        if user_native.raw < required_payment + U256::from(USER_GAS_RESERVE) {
            return Err(CustomError::InsufficientBalance(format!(
                "Insufficient {sym} balance. Need {} {sym} + gas fees.",
                format_units(required_payment, 18),
                sym = self.network.symbol
            )));
        }

        let custodial = self.custodial_wallet().await?;
        self.check_faucet_supply(custodial.as_ref(), token, token_amount)
            .await?;

        self.journal.advance(id, OperationStage::SubmittingFirstLeg);
        let payment_hash = user_signer
            .submit_native_transfer(fat_wallet, required_payment)
            .await?;
        self.journal.record_first_leg(id, payment_hash);
        info!(
            "claim {}: payment {:?} of {} {} submitted",
            id,
            payment_hash,
            format_units(required_payment, 18),
            self.network.symbol
        );

        self.journal.advance(id, OperationStage::AwaitingFirstReceipt);
        if self.wait(payment_hash).await? != ReceiptStatus::Success {
            return Err(CustomError::TransactionReverted(format!(
                "{} payment failed",
                self.network.symbol
            )));
        }
        self.journal.confirm_first_leg(id);

        self.journal.advance(id, OperationStage::SubmittingSecondLeg);
        let transfer_hash = self
            .send_tokens(custodial.as_ref(), token, user, token_amount)
            .await?;
        self.journal.record_second_leg(id, transfer_hash);

        self.journal.advance(id, OperationStage::AwaitingSecondReceipt);
        match self.wait(transfer_hash).await? {
            ReceiptStatus::Success => Ok(transfer_hash),
            ReceiptStatus::Failure => Err(CustomError::TransactionReverted(
                "Token transfer failed during execution".to_string(),
            )),
        }
    }

    async fn try_claim_tokens(
        &self,
        id: Uuid,
        user_address: &str,
        token_amount: U256,
    ) -> Result<TxHash, CustomError> {
        self.journal.advance(id, OperationStage::Validating);
        self.config.ensure_valid()?;
        let user = self.user_address(user_address)?;
        let token = self.token_address()?;
        if token_amount.is_zero() {
            return Err(CustomError::ZeroAmount);
        }

        let custodial = self.custodial_wallet().await?;
        self.check_faucet_supply(custodial.as_ref(), token, token_amount)
            .await?;

        self.journal.advance(id, OperationStage::SubmittingFirstLeg);
        let hash = self
            .send_tokens(custodial.as_ref(), token, user, token_amount)
            .await?;
        self.journal.record_first_leg(id, hash);

        self.journal.advance(id, OperationStage::AwaitingFirstReceipt);
        match self.wait(hash).await? {
            ReceiptStatus::Success => Ok(hash),
            ReceiptStatus::Failure => Err(CustomError::TransactionReverted(
                "Transaction failed during execution".to_string(),
            )),
        }
    }

    async fn try_sell_validate(
        &self,
        user_address: &str,
        token_amount: U256,
    ) -> Result<(), CustomError> {
        self.config.ensure_valid()?;
        let user = self.user_address(user_address)?;
        let token = self.token_address()?;

        if token_amount.is_zero() {
            return Err(CustomError::ZeroAmount);
        }

        let user_tokens = self.balances.token_balance(token, user).await?;
        if user_tokens.raw < token_amount {
            return Err(CustomError::InsufficientBalance(
                "Insufficient token balance".to_string(),
            ));
        }

        let user_native = self.balances.native_balance(user).await?;
        if user_native.raw < U256::from(SELLER_MIN_GAS) {
            return Err(CustomError::InsufficientGasReserve(format!(
                "Insufficient {} for gas fees",
                self.network.symbol
            )));
        }

        Ok(())
    }

    async fn try_complete_sell(
        &self,
        id: Uuid,
        user_address: &str,
        token_amount: U256,
        user_transfer_hash: &str,
    ) -> Result<TxHash, CustomError> {
        self.journal.advance(id, OperationStage::Validating);
        self.config.ensure_valid()?;
        let user = self.user_address(user_address)?;
        if token_amount.is_zero() {
            return Err(CustomError::ZeroAmount);
        }
        let user_transfer = parse_tx_hash(user_transfer_hash).ok_or_else(|| {
            CustomError::ValidationError(format!(
                "Invalid transaction hash: {}",
                user_transfer_hash
            ))
        })?;
        self.journal.record_first_leg(id, user_transfer);

        if !self.spent_transfers.take(user_transfer) {
            return Err(CustomError::ValidationError(format!(
                "Transfer {:?} was already used for a sale",
                user_transfer
            )));
        }

        let (custodial, native_to_return) = match self
            .prepare_sell_payout(id, user, token_amount, user_transfer)
            .await
        {
            Ok(prepared) => prepared,
            Err(e) => {
                self.spent_transfers.release(user_transfer);
                return Err(e);
            }
        };

        self.journal.advance(id, OperationStage::SubmittingSecondLeg);
        let payout_hash = {
            let _guard = self.custodial_lock.lock().await;
            custodial
                .submit_native_transfer(user, native_to_return)
                .await?
        };
        self.journal.record_second_leg(id, payout_hash);
        info!(
            "sell {}: payout {:?} of {} {} submitted",
            id,
            payout_hash,
            format_units(native_to_return, 18),
            self.network.symbol
        );

        self.journal.advance(id, OperationStage::AwaitingSecondReceipt);
        match self.wait(payout_hash).await? {
            ReceiptStatus::Success => Ok(payout_hash),
            ReceiptStatus::Failure => Err(CustomError::TransactionReverted(format!(
                "{} transfer back to user failed",
                self.network.symbol
            ))),
        }
    }

    /// Everything a sell checks before money leaves the custodial wallet.
    async fn prepare_sell_payout(
        &self,
        id: Uuid,
        user: Address,
        token_amount: U256,
        user_transfer: TxHash,
    ) -> Result<(Arc<dyn TransferSubmitter>, U256), CustomError> {
        self.journal.advance(id, OperationStage::AwaitingFirstReceipt);
        if self.wait(user_transfer).await? != ReceiptStatus::Success {
            return Err(CustomError::TransactionReverted(
                "Token transfer to fat wallet failed".to_string(),
            ));
        }

        let token = self.token_address()?;
        let fat_wallet = self.fat_wallet_address()?;
        let received = self
            .receipts
            .token_transfers(user_transfer)
            .await?
            .iter()
            .filter(|t| t.token == token && t.from == user && t.to == fat_wallet)
            .fold(U256::zero(), |total, t| total.saturating_add(t.value));
        if received < token_amount {
            return Err(CustomError::ValidationError(format!(
                "Transaction {:?} does not send {} tokens to the fat wallet",
                user_transfer,
                format_units(token_amount, 18)
            )));
        }
        self.journal.confirm_first_leg(id);

        let native_to_return = native_for_tokens(token_amount)?;

        let custodial = self.custodial_wallet().await?;
        let custodial_native = self.balances.native_balance(custodial.address()).await?;
        if custodial_native.raw < native_to_return + U256::from(PAYOUT_GAS_RESERVE) {
            return Err(CustomError::InsufficientGasReserve(format!(
                "Fat wallet has insufficient {sym}. Need {} {sym} + gas fees.",
                format_units(native_to_return, 18),
                sym = self.network.symbol
            )));
        }

        Ok((custodial, native_to_return))
    }

    /// Faucet must hold the tokens and enough native currency for gas.
    async fn check_faucet_supply(
        &self,
        custodial: &dyn TransferSubmitter,
        token: Address,
        token_amount: U256,
    ) -> Result<(), CustomError> {
        let faucet_tokens = self
            .balances
            .token_balance(token, custodial.address())
            .await?;
        if faucet_tokens.raw < token_amount {
            return Err(CustomError::InsufficientBalance(
                "Insufficient tokens in faucet".to_string(),
            ));
        }

        let faucet_native = self.balances.native_balance(custodial.address()).await?;
        if faucet_native.raw < U256::from(CUSTODIAL_MIN_GAS) {
            return Err(CustomError::InsufficientGasReserve(format!(
                "Faucet wallet has insufficient {} for gas fees",
                self.network.symbol
            )));
        }

        Ok(())
    }

    async fn send_tokens(
        &self,
        custodial: &dyn TransferSubmitter,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<TxHash, CustomError> {
        let _guard = self.custodial_lock.lock().await;

        let estimate = custodial
            .estimate_token_transfer_gas(token, to, amount)
            .await?;
        custodial
            .submit_token_transfer(
                token,
                to,
                amount,
                Some(estimate + U256::from(TOKEN_TRANSFER_GAS_HEADROOM)),
            )
            .await
    }

    async fn wait(&self, hash: TxHash) -> Result<ReceiptStatus, CustomError> {
        self.receipts
            .wait_for_receipt(hash, self.config.receipt_timeout)
            .await
    }

    fn finish(
        &self,
        id: Uuid,
        operation: &str,
        result: Result<TxHash, CustomError>,
    ) -> TransactionResult {
        match result {
            Ok(transaction_hash) => {
                self.journal.succeed(id);
                info!("{} {} succeeded: {:?}", operation, id, transaction_hash);
                TransactionResult::Succeeded { transaction_hash }
            }
            Err(e) => {
                let reason = classify_error(&e);
                match &e {
                    CustomError::ConfigInvalid(_)
                    | CustomError::InvalidAddressError(_)
                    | CustomError::InvalidAmountError(_)
                    | CustomError::ZeroAmount
                    | CustomError::InsufficientBalance(_)
                    | CustomError::InsufficientGasReserve(_)
                    | CustomError::ValidationError(_) => {
                        warn!("{} {} rejected: {}", operation, id, reason)
                    }
                    _ => error!("{} {} failed: {} ({})", operation, id, reason, e),
                }
                self.journal.fail(id, &reason);
                TransactionResult::failed(reason)
            }
        }
    }

    fn user_payment_signer(
        &self,
        user_address: &str,
        signed_payment: &str,
    ) -> Result<Arc<dyn TransferSubmitter>, CustomError> {
        self.config.ensure_valid()?;
        let user = self.user_address(user_address)?;
        self.wallets.user_payment(signed_payment, user)
    }

    async fn custodial_wallet(&self) -> Result<Arc<dyn TransferSubmitter>, CustomError> {
        self.custodial
            .get_or_try_init(|| async {
                let key = self.config.signing_key()?;
                self.wallets.custodial_wallet(&key)
            })
            .await
            .cloned()
    }

    fn user_address(&self, input: &str) -> Result<Address, CustomError> {
        parse_address(input).ok_or_else(|| CustomError::InvalidAddressError(input.to_string()))
    }

    fn token_address(&self) -> Result<Address, CustomError> {
        self.config
            .token_contract_address
            .as_deref()
            .and_then(parse_address)
            .ok_or_else(|| {
                CustomError::ConfigInvalid(
                    "Token contract address not configured properly".to_string(),
                )
            })
    }

    fn fat_wallet_address(&self) -> Result<Address, CustomError> {
        self.config
            .custodial_wallet_address
            .as_deref()
            .and_then(parse_address)
            .ok_or_else(|| {
                CustomError::ConfigInvalid("Fat wallet address not configured properly".to_string())
            })
    }
}
