use ethers::types::TxHash;
use serde::Serialize;

/// Outcome of an operation that submits transactions.
///
/// Success always carries the hash of the last confirmed transaction and
/// failure always carries a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "TransactionResultBody")]
pub enum TransactionResult {
    Succeeded { transaction_hash: TxHash },
    Failed { reason: String },
}

impl TransactionResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        TransactionResult::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransactionResult::Succeeded { .. })
    }

    pub fn transaction_hash(&self) -> Option<TxHash> {
        match self {
            TransactionResult::Succeeded { transaction_hash } => Some(*transaction_hash),
            TransactionResult::Failed { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            TransactionResult::Succeeded { .. } => None,
            TransactionResult::Failed { reason } => Some(reason),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResultBody {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl From<TransactionResult> for TransactionResultBody {
    fn from(result: TransactionResult) -> Self {
        match result {
            TransactionResult::Succeeded { transaction_hash } => Self {
                success: true,
                transaction_hash: Some(format!("{:?}", transaction_hash)),
                error_reason: None,
            },
            TransactionResult::Failed { reason } => Self {
                success: false,
                transaction_hash: None,
                error_reason: Some(reason),
            },
        }
    }
}
