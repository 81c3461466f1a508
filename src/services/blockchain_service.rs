use std::{str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use ethers::{
    contract::{abigen, parse_log},
    core::types::{Address, TxHash, U256},
    middleware::{NonceManagerMiddleware, SignerMiddleware},
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{
        transaction::eip2718::TypedTransaction, Bytes, NameOrAddress, TransactionReceipt,
        Log, TransactionRequest, U64,
    },
    utils::rlp::Rlp,
};
use log::{debug, error, info};

use crate::{errors::CustomError, models::token::Balance};

use super::chain::{
    BalanceReader, ReceiptStatus, ReceiptWaiter, TokenTransfer, TransferSubmitter, WalletFactory,
};

abigen!(
    Erc20Token,
    r#"[
        function balanceOf(address owner) view returns (uint256)
        function transfer(address to, uint256 amount) returns (bool)
        event Transfer(address indexed from, address indexed to, uint256 value)
    ]"#
);

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

type CustodialClient = NonceManagerMiddleware<SignerMiddleware<Provider<Http>, LocalWallet>>;

/// Read side of the chain: balances and receipts over JSON-RPC.
#[derive(Clone, Debug)]
pub struct BlockchainClient {
    provider: Arc<Provider<Http>>,
    chain_id: u64,
}

impl BlockchainClient {
    /// Connect to `rpc_url` and make sure it serves `chain_id`
    pub async fn new(rpc_url: &str, chain_id: u64) -> Result<Self, CustomError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| CustomError::NetworkError(e.to_string()))?;

        // Verify connection and chain ID
        let connected_chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| CustomError::StringifiedProviderError(e.to_string()))?;

        if connected_chain_id.as_u64() != chain_id {
            return Err(CustomError::NetworkError(
                "Connected chain ID doesn't match requested chain ID".to_string(),
            ));
        }

        info!("connected to chain {} at {}", chain_id, rpc_url);

        Ok(Self {
            provider: Arc::new(provider),
            chain_id,
        })
    }

    async fn poll_receipt(&self, hash: TxHash) -> Result<ReceiptStatus, CustomError> {
        loop {
            match self.provider.get_transaction_receipt(hash).await? {
                Some(receipt) => return Ok(receipt_status(&receipt)),
                None => {
                    debug!("receipt for {:?} not available yet", hash);
                    tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
                }
            }
        }
    }
}

fn token_transfer(log: &Log) -> Option<TokenTransfer> {
    let event: TransferFilter = parse_log(log.clone()).ok()?;
    Some(TokenTransfer {
        token: log.address,
        from: event.from,
        to: event.to,
        value: event.value,
    })
}

/// Node errors about nonces become `NonceConflict`, anything else goes
/// through `other`.
fn submission_error(message: String, other: fn(String) -> CustomError) -> CustomError {
    if message.to_ascii_lowercase().contains("nonce") {
        CustomError::NonceConflict(message)
    } else {
        other(message)
    }
}

fn receipt_status(receipt: &TransactionReceipt) -> ReceiptStatus {
    if receipt.status == Some(U64::from(1)) {
        ReceiptStatus::Success
    } else {
        ReceiptStatus::Failure
    }
}

#[async_trait]
impl BalanceReader for BlockchainClient {
    async fn native_balance(&self, address: Address) -> Result<Balance, CustomError> {
        let balance = self
            .provider
            .get_balance(address, None)
            .await
            .map_err(|e| CustomError::StringifiedProviderError(e.to_string()))?;

        Ok(Balance::from_raw(balance))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<Balance, CustomError> {
        let contract = Erc20Token::new(token, self.provider.clone());

        let balance = contract
            .balance_of(owner)
            .call()
            .await
            .map_err(|e| CustomError::ContractError(e.to_string()))?;

        Ok(Balance::from_raw(balance))
    }
}

#[async_trait]
impl ReceiptWaiter for BlockchainClient {
    async fn wait_for_receipt(
        &self,
        hash: TxHash,
        timeout: Duration,
    ) -> Result<ReceiptStatus, CustomError> {
        tokio::time::timeout(timeout, self.poll_receipt(hash))
            .await
            .map_err(|_| CustomError::TransactionTimeout(timeout.as_secs()))?
    }

    async fn token_transfers(&self, hash: TxHash) -> Result<Vec<TokenTransfer>, CustomError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await?
            .ok_or_else(|| {
                CustomError::ValidationError(format!("No receipt for transaction {:?}", hash))
            })?;

        Ok(receipt.logs.iter().filter_map(token_transfer).collect())
    }
}

impl WalletFactory for BlockchainClient {
    /// Each wallet tracks its own nonces, so callers should build it once
    /// and reuse it.
    fn custodial_wallet(
        &self,
        signing_key: &str,
    ) -> Result<Arc<dyn TransferSubmitter>, CustomError> {
        let wallet = LocalWallet::from_str(signing_key)
            .map_err(|e| CustomError::ConfigInvalid(format!("Failed to create wallet: {}", e)))?
            .with_chain_id(self.chain_id);

        let address = wallet.address();
        let signer = SignerMiddleware::new(self.provider.as_ref().clone(), wallet);

        Ok(Arc::new(CustodialWallet {
            address,
            client: Arc::new(NonceManagerMiddleware::new(signer, address)),
        }))
    }

    fn user_payment(
        &self,
        signed_payment: &str,
        user: Address,
    ) -> Result<Arc<dyn TransferSubmitter>, CustomError> {
        Ok(Arc::new(PresignedPayment::decode(
            self.provider.clone(),
            signed_payment,
            user,
        )?))
    }
}

/// The server-held wallet that owns the token supply.
pub struct CustodialWallet {
    address: Address,
    client: Arc<CustodialClient>,
}

#[async_trait]
impl TransferSubmitter for CustodialWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn submit_native_transfer(
        &self,
        to: Address,
        amount: U256,
    ) -> Result<TxHash, CustomError> {
        let tx = TransactionRequest::new().to(to).value(amount);

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| submission_error(e.to_string(), CustomError::StringifiedProviderError))?;

        Ok(pending.tx_hash())
    }

    async fn estimate_token_transfer_gas(
        &self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<U256, CustomError> {
        Erc20Token::new(token, self.client.clone())
            .transfer(to, amount)
            .from(self.address)
            .estimate_gas()
            .await
            .map_err(|e| CustomError::ContractError(e.to_string()))
    }

    async fn submit_token_transfer(
        &self,
        token: Address,
        to: Address,
        amount: U256,
        gas: Option<U256>,
    ) -> Result<TxHash, CustomError> {
        let contract = Erc20Token::new(token, self.client.clone());

        let mut call = contract.transfer(to, amount);
        if let Some(gas) = gas {
            call = call.gas(gas);
        }

        let pending = call
            .send()
            .await
            .map_err(|e| submission_error(e.to_string(), CustomError::ContractError))?;

        Ok(pending.tx_hash())
    }
}

/// A native payment the user signed in their own wallet. The server only
/// checks and broadcasts it.
pub struct PresignedPayment {
    provider: Arc<Provider<Http>>,
    raw: Bytes,
    signer: Address,
    tx: TypedTransaction,
}

impl PresignedPayment {
    pub fn decode(
        provider: Arc<Provider<Http>>,
        signed_payment: &str,
        expected_signer: Address,
    ) -> Result<Self, CustomError> {
        let raw = Bytes::from_str(signed_payment)
            .map_err(|_| CustomError::ValidationError("signed payment is not hex".to_string()))?;

        let (tx, signature) = TypedTransaction::decode_signed(&Rlp::new(raw.as_ref()))
            .map_err(|e| CustomError::ValidationError(format!("signed payment: {}", e)))?;

        let signer = signature
            .recover(tx.sighash())
            .map_err(|e| CustomError::TransactionRejectedByUser(e.to_string()))?;

        if signer != expected_signer {
            error!(
                "payment signed by {:?}, expected {:?}",
                signer, expected_signer
            );
            return Err(CustomError::TransactionRejectedByUser(
                "payment was not signed by the claiming address".to_string(),
            ));
        }

        Ok(Self {
            provider,
            raw,
            signer,
            tx,
        })
    }
}

#[async_trait]
impl TransferSubmitter for PresignedPayment {
    fn address(&self) -> Address {
        self.signer
    }

    async fn submit_native_transfer(
        &self,
        to: Address,
        amount: U256,
    ) -> Result<TxHash, CustomError> {
        if self.tx.to() != Some(&NameOrAddress::Address(to)) {
            return Err(CustomError::TransactionRejectedByUser(
                "payment recipient does not match the faucet wallet".to_string(),
            ));
        }
        if self.tx.value() != Some(&amount) {
            return Err(CustomError::TransactionRejectedByUser(format!(
                "payment value does not match the required {} wei",
                amount
            )));
        }

        let pending = self.provider.send_raw_transaction(self.raw.clone()).await?;

        Ok(pending.tx_hash())
    }

    async fn estimate_token_transfer_gas(
        &self,
        _token: Address,
        _to: Address,
        _amount: U256,
    ) -> Result<U256, CustomError> {
        Err(CustomError::TransactionRejectedByUser(
            "a signed payment cannot be used for token transfers".to_string(),
        ))
    }

    async fn submit_token_transfer(
        &self,
        _token: Address,
        _to: Address,
        _amount: U256,
        _gas: Option<U256>,
    ) -> Result<TxHash, CustomError> {
        Err(CustomError::TransactionRejectedByUser(
            "a signed payment cannot be used for token transfers".to_string(),
        ))
    }
}
