use chrono::{DateTime, Utc};
use ethers::types::TxHash;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SettlementKind {
    Claim,
    FreeClaim,
    Sell,
}

/// Per-invocation progress. `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationStage {
    Idle,
    Validating,
    SubmittingFirstLeg,
    AwaitingFirstReceipt,
    SubmittingSecondLeg,
    AwaitingSecondReceipt,
    Succeeded,
    Failed,
}

impl OperationStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationStage::Succeeded | OperationStage::Failed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementRecord {
    pub id: Uuid,
    pub kind: SettlementKind,
    pub user_address: String,
    pub amount: String,
    pub first_leg_hash: Option<TxHash>,
    pub first_leg_confirmed: bool,
    pub second_leg_hash: Option<TxHash>,
    pub stage: OperationStage,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SettlementRecord {
    /// First leg confirmed but the invocation failed afterwards.
    pub fn is_stranded(&self) -> bool {
        self.stage == OperationStage::Failed && self.first_leg_confirmed
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SettlementQuery {
    #[serde(default)]
    pub stranded: bool,
}
